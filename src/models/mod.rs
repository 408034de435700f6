mod ncm;

pub use ncm::{Ncm, NcmDraft};

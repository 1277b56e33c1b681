pub(crate) mod background;
pub(crate) mod media;
pub(crate) mod options;

pub(crate) mod cancel;
pub(crate) mod pump;
pub(crate) mod schedule;

pub(crate) mod migrate;
pub(crate) mod status;
pub(crate) mod version;

pub(crate) mod dsl;
pub(crate) mod ids;
pub(crate) mod model;
pub(crate) mod validate;
pub(crate) mod wire;

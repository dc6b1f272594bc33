pub mod manifest;
pub mod migrate;
pub mod reference;

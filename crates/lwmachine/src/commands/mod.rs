pub mod create;
pub mod flags;
pub mod inspect;
pub mod ls;
pub mod power;
pub mod rm;

pub mod cancel;
pub mod context;
pub mod kb;
pub mod policy;
pub mod rate_limit;
pub mod scope;
pub mod tech;

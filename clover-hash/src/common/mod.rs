/// Common types shared across the crate

pub mod hash_types;

pub mod hash;
pub mod mine;
pub mod retarget;
pub mod seed;
pub mod sizes;
pub mod verify;
pub mod warm;

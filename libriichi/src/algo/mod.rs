pub mod agari;
pub mod shanten;

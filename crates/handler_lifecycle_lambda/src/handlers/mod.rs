pub mod pre_sign_up;
pub mod profile;

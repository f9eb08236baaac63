pub mod build_image;
pub mod resolve;
pub mod run;

pub mod hash;
pub mod html;
pub mod object_key;
pub mod preview;
pub mod validation;

pub mod clock;
pub mod entities;
pub mod security;
pub mod use_cases;
pub mod validation;

pub mod files;
pub mod health;
pub mod logs;
pub mod system;

pub mod affordance;
pub mod client;
pub mod confirm;
pub mod controller;
pub mod files;
pub mod format;
pub mod history;
pub mod notice;
pub mod recovery;
pub mod report;
pub mod sync;

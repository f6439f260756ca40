//! # CampusDesk CLI
//!
//! Administrative tooling behind the `campusdesk-cli` binary: provisioning
//! administrators and filling a development database with fake data.

pub mod admin;
pub mod seeder;

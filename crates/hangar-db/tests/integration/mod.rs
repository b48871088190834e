mod common;
mod job_tests;
mod run_tests;
mod scheduler_tests;
mod target_tests;

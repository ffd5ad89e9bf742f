pub mod retention_scheduler;

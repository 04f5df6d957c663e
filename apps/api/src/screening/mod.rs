//! Screening: scoring extracted profiles against a job, single and batch.

pub mod batch;
pub mod handlers;
pub mod matching;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod repository;
pub mod scoring;

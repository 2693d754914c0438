// Application layer - Use cases over the sample repository
pub mod chart_service;
pub mod ingest_service;
pub mod sample_repository;
pub mod station_service;

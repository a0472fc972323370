// Meeting-notes worker - asynchronous processing pipeline
//
// Turns an uploaded meeting audio object into a speaker-attributed
// transcript and generated notes:
// - Queue consumers with retry/backoff over a durable jobs table
// - Pluggable transcription backends (mock, managed, local)
// - Heuristic notes generation with an optional LLM backend and fallback
// - Periodic audio retention sweep with tombstoning
// - In-process job telemetry

// Configuration and shared state
pub mod config;
pub mod state;

// Persistence
pub mod database;

// External collaborators
pub mod storage;
pub mod transcription;

// Processing
pub mod notes;
pub mod pipeline;
pub mod queue;
pub mod retention;

// Observability
pub mod telemetry;

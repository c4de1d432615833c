/// Integration tests over real SQLite stores
mod persistence_tests;
mod workflow_tests;

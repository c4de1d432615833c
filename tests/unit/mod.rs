/// Unit tests for the pure progress computations
mod quest_tests;
mod streak_tests;
mod unlock_tests;

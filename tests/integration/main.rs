//! Integration test harness.

mod mock_venue;

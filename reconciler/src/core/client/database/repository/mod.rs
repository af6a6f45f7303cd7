pub mod pending_state;

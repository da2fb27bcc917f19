mod balance_phase;
mod instantiate_phase;
mod persist_phase;
mod upload_phase;

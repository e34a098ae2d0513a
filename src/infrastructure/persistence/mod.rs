mod file_job_ledger;

pub use file_job_ledger::FileJobLedger;

use vaultd::domain::{JobId, StoragePath};

#[test]
fn given_job_id_and_filename_when_creating_path_then_format_is_uuid_dash_filename() {
    let job_id = JobId::new();
    let path = StoragePath::new(&job_id, "holiday.jpg");

    let expected = format!("{}-holiday.jpg", job_id.as_uuid());
    assert_eq!(path.as_str(), expected);
}

#[test]
fn given_two_jobs_with_same_filename_when_creating_paths_then_paths_differ() {
    let path_a = StoragePath::new(&JobId::new(), "file.pdf");
    let path_b = StoragePath::new(&JobId::new(), "file.pdf");

    assert_ne!(path_a, path_b);
}

#[test]
fn given_storage_path_when_displayed_then_matches_as_str() {
    let path = StoragePath::new(&JobId::new(), "test.txt");

    assert_eq!(format!("{}", path), path.as_str());
}

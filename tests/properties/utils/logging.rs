use chain_client_manager::utils::logging::compute_rolled_file_path;
use proptest::{prelude::*, test_runner::Config};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_rolled_path_format(
		dir in "[a-z]{1,10}",
		name in "[a-z-]{1,20}",
		year in 2000u32..2100,
		month in 1u32..=12,
		day in 1u32..=28,
		index in 1u32..1_000,
	) {
		let date = format!("{:04}-{:02}-{:02}", year, month, day);
		let base = format!("{}/{}.log", dir, name);

		let rolled = compute_rolled_file_path(&base, &date, index);

		prop_assert_eq!(&rolled, &format!("{}/{}-{}.{}.log", dir, name, date, index));
		prop_assert!(rolled.ends_with(".log"));
		prop_assert_eq!(rolled.matches(".log").count(), 1);
	}

	// A base path without the .log suffix keeps its full name
	#[test]
	fn test_rolled_path_without_suffix(name in "[a-z]{1,20}", index in 1u32..100) {
		let rolled = compute_rolled_file_path(&name, "2024-01-01", index);
		prop_assert_eq!(rolled, format!("{}-2024-01-01.{}.log", name, index));
	}
}

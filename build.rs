//! Embeds the build time so that the firmware can re-seed a real-time clock which lost power.
//!
//! The RTC keeps local wall-clock time. Set `BUILD_UTC_OFFSET` to the offset in seconds (for
//! example `7200` or `-18000`) so that the embedded time is local too; without it the time is UTC.

use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
	println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
	println!("cargo:rerun-if-env-changed=BUILD_UTC_OFFSET");

	// Reproducible builds can pin the timestamp.
	let timestamp = std::env::var("SOURCE_DATE_EPOCH")
		.ok()
		.and_then(|value| value.parse::<u64>().ok())
		.unwrap_or_else(|| {
			SystemTime::now()
				.duration_since(UNIX_EPOCH)
				.map(|elapsed| elapsed.as_secs())
				.unwrap_or(0)
		});

	let offset = std::env::var("BUILD_UTC_OFFSET")
		.ok()
		.and_then(|value| value.trim().parse::<i64>().ok())
		.unwrap_or(0);

	let local = if offset < 0 {
		timestamp.saturating_sub(offset.unsigned_abs())
	} else {
		timestamp.saturating_add(offset as u64)
	};

	println!("cargo:rustc-env=BUILD_TIMESTAMP={}", local);
}

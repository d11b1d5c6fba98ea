//! # Device Selection
//!
//! Picks which camera the scanner should use.
//!
//! ## Selection Rule
//! ```text
//! enumerated devices (platform order)
//!      │
//!      ├── any label containing back / rear / environment ? ──► first such device
//!      │
//!      ├── list non-empty ? ──────────────────────────────────► first device
//!      │
//!      └── empty ─────────────────────────────────────────────► None
//! ```
//!
//! Labels are only meaningful after camera access has been granted once;
//! before that the rule degrades to "first device".

use crate::types::{CameraDevice, REAR_LABEL_HINTS};

/// Returns true if the label names an environment-facing camera.
pub fn is_rear_label(label: &str) -> bool {
    let label = label.to_lowercase();
    REAR_LABEL_HINTS.iter().any(|hint| label.contains(hint))
}

/// Picks the preferred camera for scanning.
pub fn select_preferred(devices: &[CameraDevice]) -> Option<&CameraDevice> {
    devices
        .iter()
        .find(|device| is_rear_label(&device.label))
        .or_else(|| devices.first())
}

/// Returns the camera after `current_id` in enumeration order, wrapping around.
///
/// Used by the "switch camera" button. An unknown or missing `current_id`
/// yields the first device.
pub fn next_device<'a>(
    devices: &'a [CameraDevice],
    current_id: Option<&str>,
) -> Option<&'a CameraDevice> {
    if devices.is_empty() {
        return None;
    }

    let next_index = current_id
        .and_then(|id| devices.iter().position(|device| device.id == id))
        .map(|index| (index + 1) % devices.len())
        .unwrap_or(0);

    devices.get(next_index)
}

/// Finds a device by id.
pub fn find_device<'a>(devices: &'a [CameraDevice], id: &str) -> Option<&'a CameraDevice> {
    devices.iter().find(|device| device.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices(labels: &[&str]) -> Vec<CameraDevice> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| CameraDevice::new(format!("cam-{}", i), *label))
            .collect()
    }

    #[test]
    fn test_prefers_rear_label() {
        let list = devices(&["Front Camera", "Rear Camera"]);
        let picked = select_preferred(&list).unwrap();
        assert_eq!(picked.label, "Rear Camera");
    }

    #[test]
    fn test_matches_case_insensitively() {
        let list = devices(&["Integrated Webcam", "camera2 1, facing BACK"]);
        assert_eq!(select_preferred(&list).unwrap().id, "cam-1");

        let list = devices(&["Webcam", "Environment"]);
        assert_eq!(select_preferred(&list).unwrap().id, "cam-1");
    }

    #[test]
    fn test_falls_back_to_first_device() {
        let list = devices(&["Front Camera", "USB Webcam"]);
        assert_eq!(select_preferred(&list).unwrap().id, "cam-0");

        // Anonymous labels before permission was granted
        let list = devices(&["", ""]);
        assert_eq!(select_preferred(&list).unwrap().id, "cam-0");
    }

    #[test]
    fn test_empty_list_selects_nothing() {
        assert!(select_preferred(&[]).is_none());
        assert!(next_device(&[], Some("cam-0")).is_none());
    }

    #[test]
    fn test_next_device_wraps() {
        let list = devices(&["A", "B", "C"]);
        assert_eq!(next_device(&list, Some("cam-0")).unwrap().id, "cam-1");
        assert_eq!(next_device(&list, Some("cam-2")).unwrap().id, "cam-0");
        assert_eq!(next_device(&list, Some("missing")).unwrap().id, "cam-0");
        assert_eq!(next_device(&list, None).unwrap().id, "cam-0");
    }

    #[test]
    fn test_find_device() {
        let list = devices(&["A", "B"]);
        assert_eq!(find_device(&list, "cam-1").unwrap().label, "B");
        assert!(find_device(&list, "cam-9").is_none());
    }
}

//! Barangay (district) reference data

/// Barangays covered by the forecast service, in encoder order
pub const BARANGAYS: &[&str] = &[
    "General Paulino Santos",
    "Morales",
    "Santa Cruz",
    "Sto. Niño",
    "Zone II",
];

/// Look up a barangay in the static code table.
///
/// The table is the sorted barangay list, which is the same order a label
/// encoder fit on these names produces. Returns `None` for unknown names.
pub fn static_barangay_code(name: &str) -> Option<u32> {
    BARANGAYS
        .iter()
        .position(|b| *b == name)
        .map(|idx| idx as u32)
}

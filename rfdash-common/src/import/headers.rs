//! Spreadsheet header normalization
//!
//! A header is trimmed, then looked up (case-insensitively, with internal
//! whitespace collapsed) in [`HEADER_ALIASES`]. Headers that are not in the
//! table fall back to [`canonicalize`]: lower-case with whitespace runs
//! replaced by `_`. The fallback is best-effort; it only matches a field
//! when the spreadsheet already uses something close to the canonical name.

/// Known header spellings → canonical field name
///
/// Keys are lower-case with single spaces. Canonical names themselves need
/// no entry: the fallback maps them to themselves.
pub static HEADER_ALIASES: &[(&str, &str)] = &[
    // Site / cell identifiers
    ("site", "site_name"),
    ("site name", "site_name"),
    ("sitename", "site_name"),
    ("site id", "site_name"),
    ("tên trạm", "site_name"),
    ("tên_trạm", "site_name"),
    ("ten tram", "site_name"),
    ("ten_tram", "site_name"),
    ("mã trạm", "site_name"),
    ("ma tram", "site_name"),
    ("ma_tram", "site_name"),
    ("cell", "cell_name"),
    ("cell name", "cell_name"),
    ("cellname", "cell_name"),
    ("tên cell", "cell_name"),
    ("tên_cell", "cell_name"),
    ("ten cell", "cell_name"),
    ("ten_cell", "cell_name"),
    ("cellid", "cell_id"),
    ("cell id", "cell_id"),
    ("ci", "cell_id"),
    ("rnc name", "rnc"),
    ("rnc_name", "rnc"),
    ("lac id", "lac"),
    ("enodeb", "enodeb_id"),
    ("enodeb id", "enodeb_id"),
    ("enodebid", "enodeb_id"),
    ("enb id", "enodeb_id"),
    ("enbid", "enodeb_id"),
    ("enb_id", "enodeb_id"),
    ("gnodeb", "gnodeb_id"),
    ("gnodeb id", "gnodeb_id"),
    ("gnodebid", "gnodeb_id"),
    ("gnb id", "gnodeb_id"),
    ("gnbid", "gnodeb_id"),
    ("gnb_id", "gnodeb_id"),
    // Radio channel
    ("primary scrambling code", "psc"),
    ("dl uarfcn", "uarfcn"),
    ("dl_uarfcn", "uarfcn"),
    ("uarfcn dl", "uarfcn"),
    ("dl earfcn", "earfcn"),
    ("dl_earfcn", "earfcn"),
    ("earfcn dl", "earfcn"),
    ("nr-arfcn", "nr_arfcn"),
    ("nr arfcn", "nr_arfcn"),
    ("nrarfcn", "nr_arfcn"),
    ("arfcn", "nr_arfcn"),
    ("ssb", "ssb_frequency"),
    ("ssb freq", "ssb_frequency"),
    ("ssb_freq", "ssb_frequency"),
    ("ssb frequency", "ssb_frequency"),
    ("frenquency", "frequency"),
    ("freq", "frequency"),
    ("tần số", "frequency"),
    ("tần_số", "frequency"),
    ("tan so", "frequency"),
    ("tan_so", "frequency"),
    ("bw", "bandwidth"),
    ("băng thông", "bandwidth"),
    ("bang thong", "bandwidth"),
    // Coordinates
    ("long", "longitude"),
    ("lon", "longitude"),
    ("lng", "longitude"),
    ("kinh độ", "longitude"),
    ("kinh_độ", "longitude"),
    ("kinh do", "longitude"),
    ("kinh_do", "longitude"),
    ("lat", "latitude"),
    ("vĩ độ", "latitude"),
    ("vĩ_độ", "latitude"),
    ("vi do", "latitude"),
    ("vi_do", "latitude"),
    // Antenna geometry
    ("azi", "azimuth"),
    ("az", "azimuth"),
    ("hướng", "azimuth"),
    ("huong", "azimuth"),
    ("góc phương vị", "azimuth"),
    ("goc phuong vi", "azimuth"),
    ("height", "antenna_height"),
    ("antenna height", "antenna_height"),
    ("ant height", "antenna_height"),
    ("độ cao", "antenna_height"),
    ("do cao", "antenna_height"),
    ("độ cao anten", "antenna_height"),
    ("độ_cao_anten", "antenna_height"),
    ("do_cao_anten", "antenna_height"),
    ("chiều cao anten", "antenna_height"),
    ("chieu cao anten", "antenna_height"),
    ("mechanical tilt", "mechanical_tilt"),
    ("m-tilt", "mechanical_tilt"),
    ("mtilt", "mechanical_tilt"),
    ("m_tilt", "mechanical_tilt"),
    ("tilt m", "mechanical_tilt"),
    ("tilt cơ", "mechanical_tilt"),
    ("tilt co", "mechanical_tilt"),
    ("electrical tilt", "electrical_tilt"),
    ("e-tilt", "electrical_tilt"),
    ("etilt", "electrical_tilt"),
    ("e_tilt", "electrical_tilt"),
    ("tilt e", "electrical_tilt"),
    ("tilt điện", "electrical_tilt"),
    ("tilt dien", "electrical_tilt"),
    ("antenna", "antenna_type"),
    ("antenna type", "antenna_type"),
    ("ant type", "antenna_type"),
    ("loại anten", "antenna_type"),
    ("loại_anten", "antenna_type"),
    ("loai anten", "antenna_type"),
    ("loai_anten", "antenna_type"),
    // Vendor / hardware
    ("hãng_sx", "hang_sx"),
    ("hãng sx", "hang_sx"),
    ("hang sx", "hang_sx"),
    ("hãng sản xuất", "hang_sx"),
    ("hang san xuat", "hang_sx"),
    ("nhà sản xuất", "hang_sx"),
    ("vendor", "hang_sx"),
    ("manufacturer", "hang_sx"),
    ("thiết bị", "equipment"),
    ("thiết_bị", "equipment"),
    ("thiet bi", "equipment"),
    ("thiet_bi", "equipment"),
    ("loại thiết bị", "equipment"),
    ("hardware", "equipment"),
    // Location
    ("tỉnh", "province"),
    ("tinh", "province"),
    ("tỉnh/tp", "province"),
    ("tinh/tp", "province"),
    ("huyện", "district"),
    ("huyen", "district"),
    ("quận/huyện", "district"),
    ("quan/huyen", "district"),
    ("địa chỉ", "address"),
    ("địa_chỉ", "address"),
    ("dia chi", "address"),
    ("dia_chi", "address"),
    // Notes
    ("ghi chú", "ghi_chu"),
    ("ghi_chú", "ghi_chu"),
    ("ghi chu", "ghi_chu"),
    ("note", "ghi_chu"),
    ("notes", "ghi_chu"),
    ("remark", "ghi_chu"),
    ("remarks", "ghi_chu"),
];

fn clean(header: &str) -> &str {
    header.trim_start_matches('\u{feff}').trim()
}

/// Fallback canonicalization: lower-case, whitespace runs → `_`
///
/// # Examples
///
/// ```
/// use rfdash_common::import::headers::canonicalize;
///
/// assert_eq!(canonicalize("  Antenna  Type "), "antenna_type");
/// assert_eq!(canonicalize("cell_id"), "cell_id");
/// ```
pub fn canonicalize(header: &str) -> String {
    clean(header)
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Look a header up in the alias table
pub fn lookup_alias(header: &str) -> Option<&'static str> {
    let key = clean(header)
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");

    HEADER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
}

/// Normalize a spreadsheet header to a canonical field name
///
/// # Examples
///
/// ```
/// use rfdash_common::import::headers::normalize_header;
///
/// assert_eq!(normalize_header(" Frenquency "), "frequency");
/// assert_eq!(normalize_header("Hãng_SX"), "hang_sx");
/// assert_eq!(normalize_header("frequency"), "frequency");
/// ```
pub fn normalize_header(header: &str) -> String {
    match lookup_alias(header) {
        Some(canonical) => canonical.to_string(),
        None => canonicalize(header),
    }
}

#[allow(non_snake_case)]
pub const fn FOURCC(value: &str) -> u32 {
    let bytes = value.as_bytes();
    ((bytes[0] as u32) << 24) | ((bytes[1] as u32) << 16) | ((bytes[2] as u32) << 8) | (bytes[3] as u32)
}

pub fn fourcc_to_string(fourcc: u32) -> String {
    fourcc
        .to_be_bytes()
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
        .collect()
}

pub fn get_variable_multiplier(capital_x: bool, dir_version: u16) -> u32 {
    // LctX files and everything from 8.5 on index variables directly.
    if capital_x || dir_version >= 850 {
        return 1;
    }
    if dir_version >= 500 {
        return 8;
    }
    6
}

use std::path::PathBuf;

use crate::SteamError;

/// Returns the Steam base directory on Windows using the registry, falling
/// back to the default install folder under `Program Files (x86)`.
pub(crate) fn get_base_dir() -> Result<PathBuf, SteamError> {
    for subkey in [r"SOFTWARE\Wow6432Node\Valve\Steam", r"SOFTWARE\Valve\Steam"] {
        if let Ok(path) = read_install_path(subkey) {
            return Ok(path);
        }
    }

    let program_files = std::env::var_os("ProgramFiles(x86)")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Program Files (x86)"));
    let fallback = program_files.join("Steam");
    if fallback.is_dir() {
        return Ok(fallback);
    }

    Err(SteamError::NotFound)
}

fn read_install_path(subkey: &str) -> Result<PathBuf, SteamError> {
    use winreg::RegKey;
    use winreg::enums::HKEY_LOCAL_MACHINE;

    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    let key = hklm.open_subkey(subkey).map_err(|_| SteamError::NotFound)?;
    let install_path: String = key
        .get_value("InstallPath")
        .map_err(|_| SteamError::NotFound)?;
    Ok(PathBuf::from(install_path))
}

use std::fmt;

/// Target architectures, named the way package archives name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
  Amd64,
  Arm64,
  Armhf,
  I386,
  Ppc64el,
  S390x,
}

impl Arch {
  /// Detect the host CPU architecture
  pub fn current() -> Option<Self> {
    Self::from_rust_arch(std::env::consts::ARCH)
  }

  /// Map a Rust `target_arch` name to its archive name
  pub fn from_rust_arch(arch: &str) -> Option<Self> {
    match arch {
      "x86_64" => Some(Self::Amd64),
      "aarch64" => Some(Self::Arm64),
      "arm" => Some(Self::Armhf),
      "x86" => Some(Self::I386),
      "powerpc64" => Some(Self::Ppc64el),
      "s390x" => Some(Self::S390x),
      _ => None,
    }
  }

  /// Returns the lowercase archive identifier for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Amd64 => "amd64",
      Self::Arm64 => "arm64",
      Self::Armhf => "armhf",
      Self::I386 => "i386",
      Self::Ppc64el => "ppc64el",
      Self::S390x => "s390x",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Architecture name used when a project declares none.
///
/// Falls back to the raw Rust name for hosts without an archive mapping.
pub fn host_arch_name() -> String {
  Arch::current()
    .map(|a| a.as_str().to_string())
    .unwrap_or_else(|| std::env::consts::ARCH.to_string())
}

// Automatically generated by `upkeep sign --emit-public-key`, DO NOT EDIT!

/// Ed25519 public key every manifest signature is checked against.
pub const TRUSTED_PUBLIC_KEY: [u8; 32] = [
    0x2d, 0xa4, 0x9d, 0x09, 0xa4, 0x90, 0x0f, 0x52, 0x16, 0x26, 0x08, 0x8f, 0xee, 0x20, 0x6d,
    0x14, 0xc1, 0x2e, 0xaa, 0x83, 0x4b, 0x57, 0xc6, 0xbf, 0xe4, 0x03, 0xb8, 0x5a, 0xa7, 0xab,
    0xce, 0x7d,
];

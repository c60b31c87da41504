use std::fmt;

/// Describes how a key may be used, and stores additional
/// information.
///
/// Key flags are described in [Section 5.2.3.21 of RFC 4880].
///
///   [Section 5.2.3.21 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.2.3.21
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyFlags(u8);

/// This key may be used to certify other keys.
const KEY_FLAG_CERTIFY: u8 = 0x01;

/// This key may be used to sign data.
const KEY_FLAG_SIGN: u8 = 0x02;

/// This key may be used to encrypt communications.
const KEY_FLAG_ENCRYPT_FOR_TRANSPORT: u8 = 0x04;

/// This key may be used to encrypt storage.
const KEY_FLAG_ENCRYPT_AT_REST: u8 = 0x08;

/// The private component of this key may have been split by a
/// secret-sharing mechanism.
const KEY_FLAG_SPLIT_KEY: u8 = 0x10;

/// This key may be used for authentication.
const KEY_FLAG_AUTHENTICATE: u8 = 0x20;

/// The private component of this key may be in the possession of
/// more than one person.
const KEY_FLAG_GROUP_KEY: u8 = 0x80;

/// The mask of flags a key generated by this implementation may
/// carry.
const KEY_FLAG_CREATABLE: u8 = KEY_FLAG_CERTIFY | KEY_FLAG_SIGN
    | KEY_FLAG_ENCRYPT_FOR_TRANSPORT | KEY_FLAG_ENCRYPT_AT_REST
    | KEY_FLAG_AUTHENTICATE;

impl KeyFlags {
    /// Returns an empty key flags set.
    pub fn empty() -> Self {
        KeyFlags(0)
    }

    /// Creates key flags from the first octet of the wire
    /// representation.
    pub fn from_bits(bits: u8) -> Self {
        KeyFlags(bits)
    }

    /// Returns the first octet of the wire representation.
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Returns whether no flag is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns whether the flags are restricted to those a key
    /// generated by this implementation may carry.
    pub fn is_creatable(&self) -> bool {
        self.0 & !KEY_FLAG_CREATABLE == 0
    }

    /// This key may be used to certify other keys.
    pub fn for_certification(&self) -> bool {
        self.0 & KEY_FLAG_CERTIFY > 0
    }

    /// Sets whether or not this key may be used to certify other
    /// keys.
    pub fn set_certification(mut self, v: bool) -> Self {
        if v { self.0 |= KEY_FLAG_CERTIFY }
        else { self.0 &= !KEY_FLAG_CERTIFY }
        self
    }

    /// This key may be used to sign data.
    pub fn for_signing(&self) -> bool {
        self.0 & KEY_FLAG_SIGN > 0
    }

    /// Sets whether or not this key may be used to sign data.
    pub fn set_signing(mut self, v: bool) -> Self {
        if v { self.0 |= KEY_FLAG_SIGN }
        else { self.0 &= !KEY_FLAG_SIGN }
        self
    }

    /// This key may be used to encrypt communications.
    pub fn for_transport_encryption(&self) -> bool {
        self.0 & KEY_FLAG_ENCRYPT_FOR_TRANSPORT > 0
    }

    /// Sets whether or not this key may be used to encrypt
    /// communications.
    pub fn set_transport_encryption(mut self, v: bool) -> Self {
        if v { self.0 |= KEY_FLAG_ENCRYPT_FOR_TRANSPORT }
        else { self.0 &= !KEY_FLAG_ENCRYPT_FOR_TRANSPORT }
        self
    }

    /// This key may be used to encrypt storage.
    pub fn for_storage_encryption(&self) -> bool {
        self.0 & KEY_FLAG_ENCRYPT_AT_REST > 0
    }

    /// Sets whether or not this key may be used to encrypt storage.
    pub fn set_storage_encryption(mut self, v: bool) -> Self {
        if v { self.0 |= KEY_FLAG_ENCRYPT_AT_REST }
        else { self.0 &= !KEY_FLAG_ENCRYPT_AT_REST }
        self
    }

    /// This key may be used for authentication.
    pub fn for_authentication(&self) -> bool {
        self.0 & KEY_FLAG_AUTHENTICATE > 0
    }

    /// Sets whether or not this key may be used for authentication.
    pub fn set_authentication(mut self, v: bool) -> Self {
        if v { self.0 |= KEY_FLAG_AUTHENTICATE }
        else { self.0 &= !KEY_FLAG_AUTHENTICATE }
        self
    }

    /// The private component of this key may have been split using a
    /// secret-sharing mechanism.
    pub fn is_split_key(&self) -> bool {
        self.0 & KEY_FLAG_SPLIT_KEY > 0
    }

    /// The private component of this key may be in the possession of
    /// more than one person.
    pub fn is_group_key(&self) -> bool {
        self.0 & KEY_FLAG_GROUP_KEY > 0
    }
}

impl fmt::Debug for KeyFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.for_certification() {
            f.write_str("C")?;
        }
        if self.for_signing() {
            f.write_str("S")?;
        }
        if self.for_transport_encryption() {
            f.write_str("Et")?;
        }
        if self.for_storage_encryption() {
            f.write_str("Er")?;
        }
        if self.for_authentication() {
            f.write_str("A")?;
        }
        if self.is_split_key() {
            f.write_str("D")?;
        }
        if self.is_group_key() {
            f.write_str("G")?;
        }
        Ok(())
    }
}

/// Describes the features supported by an OpenPGP implementation.
///
/// See [Section 5.2.3.24 of RFC 4880].
///
///   [Section 5.2.3.24 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.2.3.24
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Features(u8);

/// Modification Detection Code packets (symmetric integrity
/// protection).
const FEATURE_FLAG_MDC: u8 = 0x01;

impl Features {
    /// Returns an empty feature set.
    pub fn empty() -> Self {
        Features(0)
    }

    /// Creates a feature set from the first octet of the wire
    /// representation.
    pub fn from_bits(bits: u8) -> Self {
        Features(bits)
    }

    /// Returns the first octet of the wire representation.
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Whether or not MDC (modification detection) is supported.
    pub fn supports_mdc(&self) -> bool {
        self.0 & FEATURE_FLAG_MDC > 0
    }

    /// Sets whether or not MDC is supported.
    pub fn set_mdc(mut self, v: bool) -> Self {
        if v { self.0 |= FEATURE_FLAG_MDC }
        else { self.0 &= !FEATURE_FLAG_MDC }
        self
    }
}

impl fmt::Debug for Features {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.supports_mdc() {
            f.write_str("MDC")?;
        }
        Ok(())
    }
}

/// Describes preferences regarding key servers.
///
/// See [Section 5.2.3.17 of RFC 4880].
///
///   [Section 5.2.3.17 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.2.3.17
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyServerPreferences(u8);

/// The key holder requests that this key only be modified or updated
/// by the key holder or an administrator of the key server.
const KEYSERVER_PREFERENCE_NO_MODIFY: u8 = 0x80;

impl KeyServerPreferences {
    /// Returns an empty preference set.
    pub fn empty() -> Self {
        KeyServerPreferences(0)
    }

    /// Creates a preference set from the first octet of the wire
    /// representation.
    pub fn from_bits(bits: u8) -> Self {
        KeyServerPreferences(bits)
    }

    /// Returns the first octet of the wire representation.
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Whether or not the key on the key servers should only be
    /// modified by the key holder.
    pub fn no_modify(&self) -> bool {
        self.0 & KEYSERVER_PREFERENCE_NO_MODIFY > 0
    }

    /// Sets whether or not the key on the key servers should only be
    /// modified by the key holder.
    pub fn set_no_modify(mut self, v: bool) -> Self {
        if v { self.0 |= KEYSERVER_PREFERENCE_NO_MODIFY }
        else { self.0 &= !KEYSERVER_PREFERENCE_NO_MODIFY }
        self
    }
}

impl fmt::Debug for KeyServerPreferences {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.no_modify() {
            f.write_str("no-modify")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_flags() {
        let f = KeyFlags::empty()
            .set_certification(true)
            .set_signing(true);
        assert_eq!(f.bits(), 0x03);
        assert!(f.for_certification());
        assert!(f.for_signing());
        assert!(!f.for_authentication());
        assert!(f.is_creatable());

        let e = KeyFlags::empty()
            .set_transport_encryption(true)
            .set_storage_encryption(true);
        assert_eq!(e.bits(), 0x0c);

        assert!(!KeyFlags::from_bits(0x10).is_creatable());
        assert!(!KeyFlags::from_bits(0x80).is_creatable());
    }

    #[test]
    fn features() {
        assert!(!Features::empty().supports_mdc());
        assert!(Features::empty().set_mdc(true).supports_mdc());
        assert_eq!(Features::empty().set_mdc(true).bits(), 0x01);
    }

    #[test]
    fn keyserver_preferences() {
        assert!(KeyServerPreferences::from_bits(0x80).no_modify());
        assert!(!KeyServerPreferences::empty().no_modify());
    }
}

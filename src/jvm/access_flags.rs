use bitflags::bitflags;

bitflags! {
    /// Access flags on methods
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.6-200-A.1
    pub struct MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

impl MethodAccessFlags {
    /// Methods with these flags never carry bytecode, only a shell `Code` body (if any)
    pub const NO_BODY: MethodAccessFlags = MethodAccessFlags::from_bits_truncate(
        MethodAccessFlags::ABSTRACT.bits() | MethodAccessFlags::NATIVE.bits(),
    );

    /// Is this method expected to have bytecode?
    pub fn expects_body(&self) -> bool {
        !self.intersects(Self::NO_BODY)
    }
}

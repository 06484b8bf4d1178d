//! JVM access flags for classes, methods, and fields.
//!
//! Values follow JVMS Table 4.1-B/4.6-A/4.5-A. Only the bits the engine
//! distinguishes between are modeled; unknown bits are dropped by
//! `from_bits_truncate` when the parser hands over raw `u16` flag words.

use bitflags::bitflags;

bitflags! {
    /// Class-level access and property flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClassAccess: u16 {
        /// Declared public.
        const PUBLIC = 0x0001;
        /// Declared final.
        const FINAL = 0x0010;
        /// Treat superclass methods specially when invoked (historic).
        const SUPER = 0x0020;
        /// Is an interface.
        const INTERFACE = 0x0200;
        /// Declared abstract.
        const ABSTRACT = 0x0400;
        /// Not present in source code.
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface.
        const ANNOTATION = 0x2000;
        /// Declared as an enum class.
        const ENUM = 0x4000;
    }
}

bitflags! {
    /// Method-level access and property flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MethodAccess: u16 {
        /// Declared public.
        const PUBLIC = 0x0001;
        /// Declared private.
        const PRIVATE = 0x0002;
        /// Declared protected.
        const PROTECTED = 0x0004;
        /// Declared static.
        const STATIC = 0x0008;
        /// Declared final.
        const FINAL = 0x0010;
        /// Declared synchronized.
        const SYNCHRONIZED = 0x0020;
        /// Compiler-generated bridge method.
        const BRIDGE = 0x0040;
        /// Declared with a variable number of arguments.
        const VARARGS = 0x0080;
        /// Implemented in a language other than Java.
        const NATIVE = 0x0100;
        /// Declared abstract.
        const ABSTRACT = 0x0400;
        /// Declared strictfp.
        const STRICT = 0x0800;
        /// Not present in source code.
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    /// Field-level access and property flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FieldAccess: u16 {
        /// Declared public.
        const PUBLIC = 0x0001;
        /// Declared private.
        const PRIVATE = 0x0002;
        /// Declared protected.
        const PROTECTED = 0x0004;
        /// Declared static.
        const STATIC = 0x0008;
        /// Declared final.
        const FINAL = 0x0010;
        /// Declared volatile.
        const VOLATILE = 0x0040;
        /// Declared transient.
        const TRANSIENT = 0x0080;
        /// Not present in source code.
        const SYNTHETIC = 0x1000;
        /// Element of an enum class.
        const ENUM = 0x4000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_unknown_bits() {
        let access = MethodAccess::from_bits_truncate(0x0008 | 0x8000);
        assert_eq!(access, MethodAccess::STATIC);
    }

    #[test]
    fn test_class_flag_values() {
        assert_eq!(ClassAccess::INTERFACE.bits(), 0x0200);
        assert_eq!(ClassAccess::ENUM.bits(), 0x4000);
    }
}

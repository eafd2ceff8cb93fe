//! Byte-level class file builder for tests.
//!
//! Only depends on `std` so the integration tests can include it as well.

#![allow(dead_code)]

use std::collections::HashMap;

pub const TAG_UTF: u8 = 1;
pub const TAG_FILLER: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_FLOAT: u8 = 4;
pub const TAG_LONG: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_CLASS: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_FIELDREF: u8 = 9;
pub const TAG_METHODREF: u8 = 10;
pub const TAG_INTERFACE_METHODREF: u8 = 11;
pub const TAG_NAME_AND_TYPE: u8 = 12;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_SYNTHETIC: u16 = 0x1000;

/// Constant pool under construction. Entries are deduplicated the way javac does.
#[derive(Default, Clone)]
pub struct PoolBuilder {
    bytes: Vec<u8>,
    next: u16,
    utf: HashMap<Vec<u8>, u16>,
    classes: HashMap<String, u16>,
}

impl PoolBuilder {
    pub fn new() -> Self {
        PoolBuilder {
            next: 1,
            ..Default::default()
        }
    }

    /// Index the next entry will get
    pub fn next_index(&self) -> u16 {
        self.next
    }

    /// Append a raw entry that occupies `slots` slots
    pub fn raw(&mut self, bytes: &[u8], slots: u16) -> u16 {
        let index = self.next;
        self.bytes.extend_from_slice(bytes);
        self.next += slots;
        index
    }

    pub fn utf_bytes(&mut self, value: &[u8]) -> u16 {
        if let Some(index) = self.utf.get(value) {
            return *index;
        }
        let mut entry = vec![TAG_UTF];
        entry.extend_from_slice(&(value.len() as u16).to_be_bytes());
        entry.extend_from_slice(value);
        let index = self.raw(&entry, 1);
        self.utf.insert(value.to_vec(), index);
        index
    }

    pub fn utf(&mut self, value: &str) -> u16 {
        self.utf_bytes(value.as_bytes())
    }

    pub fn int(&mut self, value: i32) -> u16 {
        let mut entry = vec![TAG_INT];
        entry.extend_from_slice(&value.to_be_bytes());
        self.raw(&entry, 1)
    }

    pub fn float(&mut self, value: f32) -> u16 {
        let mut entry = vec![TAG_FLOAT];
        entry.extend_from_slice(&value.to_bits().to_be_bytes());
        self.raw(&entry, 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        let mut entry = vec![TAG_LONG];
        entry.extend_from_slice(&value.to_be_bytes());
        self.raw(&entry, 2)
    }

    pub fn double(&mut self, value: f64) -> u16 {
        let mut entry = vec![TAG_DOUBLE];
        entry.extend_from_slice(&value.to_bits().to_be_bytes());
        self.raw(&entry, 2)
    }

    pub fn class(&mut self, name: &str) -> u16 {
        if let Some(index) = self.classes.get(name) {
            return *index;
        }
        let name_index = self.utf(name);
        let index = self.index_entry(TAG_CLASS, name_index);
        self.classes.insert(name.to_string(), index);
        index
    }

    pub fn string(&mut self, value: &str) -> u16 {
        let utf = self.utf(value);
        self.index_entry(TAG_STRING, utf)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf(name);
        let descriptor = self.utf(descriptor);
        self.pair_entry(TAG_NAME_AND_TYPE, name, descriptor)
    }

    pub fn field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(TAG_FIELDREF, class, name, descriptor)
    }

    pub fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(TAG_METHODREF, class, name, descriptor)
    }

    pub fn interface_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(TAG_INTERFACE_METHODREF, class, name, descriptor)
    }

    fn member_ref(&mut self, tag: u8, class: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(class);
        let name_and_type = self.name_and_type(name, descriptor);
        self.pair_entry(tag, class, name_and_type)
    }

    /// Entry of the form tag, u2
    pub fn index_entry(&mut self, tag: u8, index: u16) -> u16 {
        let mut entry = vec![tag];
        entry.extend_from_slice(&index.to_be_bytes());
        self.raw(&entry, 1)
    }

    /// Entry of the form tag, u2, u2
    pub fn pair_entry(&mut self, tag: u8, index1: u16, index2: u16) -> u16 {
        let mut entry = vec![tag];
        entry.extend_from_slice(&index1.to_be_bytes());
        entry.extend_from_slice(&index2.to_be_bytes());
        self.raw(&entry, 1)
    }

    /// The pool as it appears in a class file: u2 count followed by the entries
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.next.to_be_bytes().to_vec();
        out.extend_from_slice(&self.bytes);
        out
    }
}

/// An attribute as `(name, body)` with an optional declared length override.
#[derive(Clone)]
pub struct RawAttribute {
    pub name: String,
    pub body: Vec<u8>,
    pub declared: Option<u32>,
}

impl RawAttribute {
    pub fn new(name: &str, body: Vec<u8>) -> Self {
        RawAttribute {
            name: name.to_string(),
            body,
            declared: None,
        }
    }

    pub fn with_declared(mut self, declared: u32) -> Self {
        self.declared = Some(declared);
        self
    }
}

#[derive(Clone)]
struct RawMember {
    access: u16,
    name: String,
    descriptor: String,
    attributes: Vec<RawAttribute>,
}

/// Assembles a complete class file.
#[derive(Clone)]
pub struct ClassBuilder {
    pub pool: PoolBuilder,
    magic: u32,
    minor: u16,
    major: u16,
    access: u16,
    this_class: String,
    super_index: Option<u16>,
    super_class: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<RawMember>,
    methods: Vec<RawMember>,
    attributes: Vec<RawAttribute>,
    trailing: Vec<u8>,
}

impl ClassBuilder {
    pub fn new(this_class: &str) -> Self {
        ClassBuilder {
            pool: PoolBuilder::new(),
            magic: 0xCAFE_BABE,
            minor: 0,
            major: 49,
            access: ACC_PUBLIC | ACC_SUPER,
            this_class: this_class.to_string(),
            super_index: None,
            super_class: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            trailing: Vec::new(),
        }
    }

    pub fn with_magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    pub fn with_version(mut self, major: u16, minor: u16) -> Self {
        self.major = major;
        self.minor = minor;
        self
    }

    pub fn with_access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn with_super(mut self, name: Option<&str>) -> Self {
        self.super_class = name.map(str::to_string);
        self
    }

    /// Write `index` as the super class index verbatim
    pub fn with_super_index(mut self, index: u16) -> Self {
        self.super_index = Some(index);
        self
    }

    pub fn with_interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn with_field(mut self, access: u16, name: &str, descriptor: &str) -> Self {
        self.fields.push(RawMember {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            attributes: Vec::new(),
        });
        self
    }

    pub fn with_field_attributes(
        mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        attributes: Vec<RawAttribute>,
    ) -> Self {
        self.fields.push(RawMember {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            attributes,
        });
        self
    }

    pub fn with_method(mut self, access: u16, name: &str, descriptor: &str) -> Self {
        self.methods.push(RawMember {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            attributes: Vec::new(),
        });
        self
    }

    pub fn with_method_attributes(
        mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        attributes: Vec<RawAttribute>,
    ) -> Self {
        self.methods.push(RawMember {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            attributes,
        });
        self
    }

    pub fn with_attribute(mut self, attribute: RawAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_trailing(mut self, bytes: &[u8]) -> Self {
        self.trailing.extend_from_slice(bytes);
        self
    }

    fn write_attributes(pool: &mut PoolBuilder, out: &mut Vec<u8>, attributes: &[RawAttribute]) {
        out.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
        for attribute in attributes {
            let name = pool.utf(&attribute.name);
            out.extend_from_slice(&name.to_be_bytes());
            let declared = attribute.declared.unwrap_or(attribute.body.len() as u32);
            out.extend_from_slice(&declared.to_be_bytes());
            out.extend_from_slice(&attribute.body);
        }
    }

    fn write_members(pool: &mut PoolBuilder, out: &mut Vec<u8>, members: &[RawMember]) {
        out.extend_from_slice(&(members.len() as u16).to_be_bytes());
        for member in members {
            out.extend_from_slice(&member.access.to_be_bytes());
            out.extend_from_slice(&pool.utf(&member.name).to_be_bytes());
            out.extend_from_slice(&pool.utf(&member.descriptor).to_be_bytes());
            Self::write_attributes(pool, out, &member.attributes);
        }
    }

    /// Serialize the class. Pool entries for all names are created on the fly.
    pub fn build(&self) -> Vec<u8> {
        let mut pool = self.pool.clone();
        let mut body = Vec::new();

        body.extend_from_slice(&self.access.to_be_bytes());
        body.extend_from_slice(&pool.class(&self.this_class).to_be_bytes());
        let super_index = match (self.super_index, &self.super_class) {
            (Some(index), _) => index,
            (None, Some(name)) => pool.class(name),
            (None, None) => 0,
        };
        body.extend_from_slice(&super_index.to_be_bytes());

        body.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            body.extend_from_slice(&pool.class(interface).to_be_bytes());
        }

        Self::write_members(&mut pool, &mut body, &self.fields);
        Self::write_members(&mut pool, &mut body, &self.methods);
        Self::write_attributes(&mut pool, &mut body, &self.attributes);
        body.extend_from_slice(&self.trailing);

        let mut out = Vec::new();
        out.extend_from_slice(&self.magic.to_be_bytes());
        out.extend_from_slice(&self.minor.to_be_bytes());
        out.extend_from_slice(&self.major.to_be_bytes());
        out.extend_from_slice(&pool.to_bytes());
        out.extend_from_slice(&body);
        out
    }
}

/// u2 helper for attribute bodies
pub fn u2(value: u16) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Concatenate u2 values
pub fn u2s(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

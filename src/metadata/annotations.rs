//! Annotation blocks.
//!
//! `RuntimeVisibleAnnotations` attributes on classes, fields and methods hold a table of
//! annotations, each naming its type and a list of `name = value` pairs. This module decodes
//! that structure and interns the annotation types; it attaches no meaning to the values.

use crate::{
    file::parser::Parser,
    metadata::{
        constpool::{ConstantPool, PackedEntry},
        runtime::{decode_modified_utf8, AtomId, LoaderId, TypeRefId},
    },
    Result,
};

/// Maximum nesting of annotations and arrays inside one element value
pub const MAX_NESTING_DEPTH: usize = 64;

/// One decoded annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// The annotation type, interned through the loader of the annotated class
    pub type_ref: TypeRefId,
    /// `name = value` pairs in declaration order
    pub elements: Vec<ElementPair>,
}

/// A `name = value` pair of an annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPair {
    /// Element name
    pub name: AtomId,
    /// Element value
    pub value: ElementValue,
}

/// The value of an annotation element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    /// A primitive or string constant; `tag` is one of `BCDFIJSZs`
    Const {
        /// The element tag
        tag: u8,
        /// The referenced constant pool entry
        entry: PackedEntry,
    },
    /// An enum constant
    Enum {
        /// Descriptor of the enum type
        type_name: AtomId,
        /// Name of the constant
        const_name: AtomId,
    },
    /// A class literal, as a return descriptor (`V` for `void.class`)
    Class(AtomId),
    /// A nested annotation
    Annotation(Box<Annotation>),
    /// An array of values
    Array(Vec<ElementValue>),
}

/// Reads a `RuntimeVisibleAnnotations` attribute body.
pub trait AnnotationReader: Send + Sync {
    /// Read one annotation table from `parser`.
    ///
    /// # Arguments
    /// * `pool` - The resolved constant pool of the class being read
    /// * `parser` - Positioned at the u2 annotation count
    /// * `loader` - Loader through which annotation types are interned
    ///
    /// # Errors
    /// Returns an error for malformed annotation structures or bad constant pool indices.
    fn read_annotations(
        &self,
        pool: &ConstantPool,
        parser: &mut Parser,
        loader: LoaderId,
    ) -> Result<Vec<Annotation>>;
}

/// The default [`AnnotationReader`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAnnotationReader;

impl AnnotationReader for DefaultAnnotationReader {
    fn read_annotations(
        &self,
        pool: &ConstantPool,
        parser: &mut Parser,
        loader: LoaderId,
    ) -> Result<Vec<Annotation>> {
        let count = parser.read_be::<u16>()?;
        let mut annotations = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            annotations.push(read_annotation(pool, parser, loader, 0)?);
        }
        Ok(annotations)
    }
}

fn read_annotation(
    pool: &ConstantPool,
    parser: &mut Parser,
    loader: LoaderId,
    depth: usize,
) -> Result<Annotation> {
    let type_name = pool.utf(parser.read_be()?)?;
    let descriptor = decode_modified_utf8(pool.runtime().atom(type_name)?.bytes())?;
    if !descriptor.starts_with('L') || !descriptor.ends_with(';') {
        return Err(malformed_error!(
            "Annotation type is not a class descriptor - {}",
            descriptor
        ));
    }
    let type_ref = pool.runtime().types.find_or_create(loader, &descriptor)?;

    let count = parser.read_be::<u16>()?;
    let mut elements = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let name = pool.utf(parser.read_be()?)?;
        let value = read_element_value(pool, parser, loader, depth)?;
        elements.push(ElementPair { name, value });
    }

    Ok(Annotation { type_ref, elements })
}

fn read_element_value(
    pool: &ConstantPool,
    parser: &mut Parser,
    loader: LoaderId,
    depth: usize,
) -> Result<ElementValue> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(malformed_error!(
            "Annotation values nested deeper than {}",
            MAX_NESTING_DEPTH
        ));
    }

    let tag = parser.read_be::<u8>()?;
    match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => {
            let index = parser.read_be()?;
            if tag == b's' {
                pool.utf(index)?;
            } else {
                pool.literal_description(index)?;
            }
            Ok(ElementValue::Const {
                tag,
                entry: pool.entry(index)?,
            })
        }
        b'e' => Ok(ElementValue::Enum {
            type_name: pool.utf(parser.read_be()?)?,
            const_name: pool.utf(parser.read_be()?)?,
        }),
        b'c' => Ok(ElementValue::Class(pool.utf(parser.read_be()?)?)),
        b'@' => Ok(ElementValue::Annotation(Box::new(read_annotation(
            pool,
            parser,
            loader,
            depth + 1,
        )?))),
        b'[' => {
            let count = parser.read_be::<u16>()?;
            let mut values = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                values.push(read_element_value(pool, parser, loader, depth + 1)?);
            }
            Ok(ElementValue::Array(values))
        }
        _ => Err(malformed_error!("Unknown annotation element tag - {}", tag)),
    }
}

mod common;

use common::*;
use jdec::jvm::class_file::*;
use jdec::jvm::visitor::*;
use jdec::jvm::*;

#[derive(Default)]
struct BodyRecorder {
    events: Vec<String>,
}

impl InstructionVisitor for BodyRecorder {
    fn visit_code(&mut self, code: &ByteRegion) {
        self.events.push(format!("code {:02x?}", code.as_slice()));
    }

    fn visit_exception_handler(&mut self, handler: &ExceptionTableEntry) {
        self.events.push(format!(
            "handler {}..{} -> {}",
            handler.start_offset, handler.end_offset, handler.handler_offset
        ));
    }

    fn visit_end(&mut self) {
        self.events.push(String::from("end"));
    }
}

#[derive(Default)]
struct Recorder {
    wants_body: bool,
    declines_body: bool,
    events: Vec<String>,
    body: BodyRecorder,
}

impl MethodVisitor for Recorder {
    fn can_visit_body(&self) -> bool {
        self.wants_body
    }

    fn visit_body(
        &mut self,
        max_stack: u32,
        max_locals: u32,
    ) -> Option<&mut dyn InstructionVisitor> {
        self.events.push(format!("body {} {}", max_stack, max_locals));
        if self.declines_body {
            None
        } else {
            Some(&mut self.body)
        }
    }

    fn visit_line_number(&mut self, instruction: &Instruction, line_number: u32) {
        self.events.push(format!(
            "line {} at {} ({:#04x})",
            line_number, instruction.offset, instruction.opcode
        ));
    }

    fn visit_attribute(&mut self, attribute: &Attribute) {
        self.events.push(format!("attribute {}", attribute.name()));
    }

    fn visit_annotation(&mut self, _annotations: &RawAttribute, visible: bool) {
        self.events.push(format!("annotation visible={}", visible));
    }

    fn visit_end(&mut self) {
        self.events.push(String::from("end"));
    }
}

impl Recorder {
    fn ends(&self) -> usize {
        self.events.iter().filter(|event| *event == "end").count()
    }
}

/// `this.<init>(); return;` with a line number table, thrown exceptions and annotations
fn constructor(line_numbers: Vec<u8>) -> MethodDefinition {
    let mut pool = VecConstantPool::new();
    let io_exception = pool.add_class("java/io/IOException");
    let line_number_table = attribute(&mut pool, "LineNumberTable", &line_numbers);
    let attributes = vec![
        code_attribute(
            &mut pool,
            1,
            1,
            &[0x2a, 0xb7, 0x00, 0x01, 0xb1],
            &[Handler {
                start: 0,
                end: 4,
                handler: 4,
                catch_type: 0,
            }],
            &[line_number_table],
        ),
        exceptions_attribute(&mut pool, &[io_exception]),
        attribute(&mut pool, "RuntimeVisibleAnnotations", &[0, 0]),
        attribute(&mut pool, "RuntimeInvisibleAnnotations", &[0, 0]),
        attribute(&mut pool, "Deprecated", &[]),
    ];
    let bytes = attribute_list(&attributes);

    let settings = ReaderSettings::default();
    let (attributes, _) = AttributeReader::new(&bytes, &pool, &settings)
        .read_attributes(0)
        .unwrap();
    MethodDefinition::from_class_file(
        TypeReference::object(BinaryName::OBJECT.nested("Inner")),
        &[],
        "<init>",
        MethodAccessFlags::PUBLIC,
        "()V",
        None,
        attributes,
    )
    .unwrap()
}

fn well_formed_line_numbers() -> Vec<u8> {
    vec![0, 2, 0, 0, 0, 7, 0, 4, 0, 8]
}

#[test]
fn full_traversal_order() {
    init_logger();
    let method = constructor(well_formed_line_numbers());
    let mut visitor = Recorder {
        wants_body: true,
        ..Recorder::default()
    };
    method.accept(&mut visitor).unwrap();

    assert_eq!(
        visitor.events,
        vec![
            "attribute Exceptions",
            "annotation visible=true",
            "annotation visible=false",
            "attribute Deprecated",
            "body 1 1",
            "line 7 at 0 (0x2a)",
            "line 8 at 4 (0xb1)",
            "end",
        ]
    );
    assert_eq!(
        visitor.body.events,
        vec!["code [2a, b7, 00, 01, b1]", "handler 0..4 -> 4", "end"]
    );
}

#[test]
fn skipped_body_still_ends() {
    init_logger();
    let method = constructor(well_formed_line_numbers());
    let mut visitor = Recorder::default();
    method.accept(&mut visitor).unwrap();

    assert!(visitor.body.events.is_empty());
    assert!(!visitor.events.iter().any(|event| event.starts_with("body")));
    assert!(!visitor.events.iter().any(|event| event.starts_with("line")));
    assert_eq!(visitor.ends(), 1);
    assert_eq!(visitor.events.last().map(String::as_str), Some("end"));
}

#[test]
fn declined_body() {
    init_logger();
    let method = constructor(well_formed_line_numbers());
    let mut visitor = Recorder {
        wants_body: true,
        declines_body: true,
        ..Recorder::default()
    };
    method.accept(&mut visitor).unwrap();

    assert!(visitor.body.events.is_empty());
    assert!(visitor.events.contains(&String::from("body 1 1")));
    assert_eq!(visitor.ends(), 1);
}

#[test]
fn methods_without_code() {
    init_logger();
    let method = MethodDefinition::new(
        TypeReference::object(BinaryName::OBJECT),
        UnqualifiedName::HASHCODE,
        MethodAccessFlags::PUBLIC | MethodAccessFlags::NATIVE,
        MethodSignature::parse_descriptor("()I").unwrap(),
    )
    .with_body(CodeAttribute::without_code(12, 0, 1, vec![]))
    .unwrap();

    let mut visitor = Recorder {
        wants_body: true,
        ..Recorder::default()
    };
    method.accept(&mut visitor).unwrap();
    assert_eq!(visitor.events, vec!["end"]);
}

#[test]
fn broken_line_numbers_still_end() {
    init_logger();
    let method = constructor(vec![0, 2, 0, 0, 0, 7]);
    let mut visitor = Recorder {
        wants_body: true,
        ..Recorder::default()
    };
    assert!(matches!(
        method.accept(&mut visitor),
        Err(Error::IoError(_))
    ));
    assert_eq!(visitor.ends(), 1);
    assert_eq!(visitor.events.last().map(String::as_str), Some("end"));
}

#[test]
fn default_callbacks_do_nothing() {
    struct Silent;
    impl MethodVisitor for Silent {}

    let method = constructor(well_formed_line_numbers());
    assert!(method.accept(&mut Silent).is_ok());

    let dyn_visitor: &mut dyn MethodVisitor = &mut Silent;
    assert!(method.accept(dyn_visitor).is_ok());
}

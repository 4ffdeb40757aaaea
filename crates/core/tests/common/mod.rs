#![allow(dead_code)]

use plugscan_core::descriptor::PLUGIN_DESCRIPTOR;
use plugscan_core::fallback::ClassRunner;
use plugscan_core::{DiscoveryError, PluginNameAggregator, ResourceTracker, ScanConfig};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const ACC_PUBLIC: u16 = 0x0001;
const ACC_PRIVATE: u16 = 0x0002;
const ACC_STATIC: u16 = 0x0008;
const ACC_FINAL: u16 = 0x0010;
const ACC_SUPER: u16 = 0x0020;
const ACC_ABSTRACT: u16 = 0x0400;

const ACONST_NULL: u8 = 0x01;
const ICONST_0: u8 = 0x03;
const LDC: u8 = 0x12;
const LDC_W: u8 = 0x13;
const ALOAD_0: u8 = 0x2a;
const POP: u8 = 0x57;
const DUP: u8 = 0x59;
const IFEQ: u8 = 0x99;
const GOTO: u8 = 0xa7;
const ARETURN: u8 = 0xb0;
const RETURN: u8 = 0xb1;
const GETSTATIC: u8 = 0xb2;
const GETFIELD: u8 = 0xb4;
const PUTFIELD: u8 = 0xb5;
const INVOKEVIRTUAL: u8 = 0xb6;
const INVOKESPECIAL: u8 = 0xb7;
const NEW: u8 = 0xbb;

const STRING_TYPE: &str = "Ljava/lang/String;";
const STRING_BUILDER: &str = "java/lang/StringBuilder";
const APPEND_DESCRIPTOR: &str = "(Ljava/lang/String;)Ljava/lang/StringBuilder;";
const GET_NAME: &str = "getName";
const GET_NAME_DESCRIPTOR: &str = "()Ljava/lang/String;";

/// Assembles minimal Java 8 class files byte by byte.
pub struct ClassBuilder {
    pool: Vec<u8>,
    next_index: u16,
    this_class: u16,
    super_class: u16,
    fields: Vec<u8>,
    field_count: u16,
    methods: Vec<u8>,
    method_count: u16,
}

impl ClassBuilder {
    pub fn new(class_name: &str) -> Self {
        let mut builder = Self {
            pool: Vec::new(),
            next_index: 1,
            this_class: 0,
            super_class: 0,
            fields: Vec::new(),
            field_count: 0,
            methods: Vec::new(),
            method_count: 0,
        };
        builder.this_class = builder.class_ref(&class_name.replace('.', "/"));
        builder.super_class = builder.class_ref("java/lang/Object");
        builder
    }

    fn push_constant(&mut self, bytes: Vec<u8>) -> u16 {
        let index = self.next_index;
        self.pool.extend(bytes);
        self.next_index += 1;
        index
    }

    fn utf8(&mut self, value: &str) -> u16 {
        let mut bytes = vec![1];
        bytes.extend((value.len() as u16).to_be_bytes());
        bytes.extend(value.as_bytes());
        self.push_constant(bytes)
    }

    fn class_ref(&mut self, internal_name: &str) -> u16 {
        let name = self.utf8(internal_name);
        let mut bytes = vec![7];
        bytes.extend(name.to_be_bytes());
        self.push_constant(bytes)
    }

    fn string(&mut self, value: &str) -> u16 {
        let utf8 = self.utf8(value);
        let mut bytes = vec![8];
        bytes.extend(utf8.to_be_bytes());
        self.push_constant(bytes)
    }

    fn integer(&mut self, value: i32) -> u16 {
        let mut bytes = vec![3];
        bytes.extend(value.to_be_bytes());
        self.push_constant(bytes)
    }

    fn member_ref(&mut self, tag: u8, owner: u16, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let mut name_and_type = vec![12];
        name_and_type.extend(name.to_be_bytes());
        name_and_type.extend(descriptor.to_be_bytes());
        let name_and_type = self.push_constant(name_and_type);

        let mut bytes = vec![tag];
        bytes.extend(owner.to_be_bytes());
        bytes.extend(name_and_type.to_be_bytes());
        self.push_constant(bytes)
    }

    fn field_ref(&mut self, field: &str) -> [u8; 2] {
        let owner = self.this_class;
        self.member_ref(9, owner, field, STRING_TYPE).to_be_bytes()
    }

    fn ldc(&mut self, value: &str) -> Vec<u8> {
        let index = self.string(value);
        match u8::try_from(index) {
            Ok(short) => vec![LDC, short],
            Err(_) => {
                let [hi, lo] = index.to_be_bytes();
                vec![LDC_W, hi, lo]
            }
        }
    }

    fn add_method(
        &mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        code: Option<(Vec<u8>, u16)>,
    ) {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let mut method = Vec::new();
        method.extend(access.to_be_bytes());
        method.extend(name.to_be_bytes());
        method.extend(descriptor.to_be_bytes());
        match code {
            None => method.extend(0u16.to_be_bytes()),
            Some((code, max_stack)) => {
                let code_name = self.utf8("Code");
                let max_locals: u16 = 1;
                let length = 2 + 2 + 4 + code.len() as u32 + 2 + 2;
                method.extend(1u16.to_be_bytes());
                method.extend(code_name.to_be_bytes());
                method.extend(length.to_be_bytes());
                method.extend(max_stack.to_be_bytes());
                method.extend(max_locals.to_be_bytes());
                method.extend((code.len() as u32).to_be_bytes());
                method.extend(code);
                method.extend(0u16.to_be_bytes());
                method.extend(0u16.to_be_bytes());
            }
        }
        self.methods.extend(method);
        self.method_count += 1;
    }

    fn super_init(&mut self) -> Vec<u8> {
        let owner = self.super_class;
        let [hi, lo] = self.member_ref(10, owner, "<init>", "()V").to_be_bytes();
        vec![ALOAD_0, INVOKESPECIAL, hi, lo]
    }

    /// Fills the constant pool so later constants need `ldc_w`.
    pub fn pad_constants(mut self, count: usize) -> Self {
        for i in 0..count {
            self.utf8(&format!("pad{i}"));
        }
        self
    }

    pub fn default_constructor(mut self) -> Self {
        let mut code = self.super_init();
        code.push(RETURN);
        self.add_method(ACC_PUBLIC, "<init>", "()V", Some((code, 1)));
        self
    }

    /// Declares `field` and a constructor assigning it `value`.
    pub fn constructor_setting_field(mut self, field: &str, value: &str) -> Self {
        let name = self.utf8(field);
        let descriptor = self.utf8(STRING_TYPE);
        self.fields.extend((ACC_PRIVATE | ACC_FINAL).to_be_bytes());
        self.fields.extend(name.to_be_bytes());
        self.fields.extend(descriptor.to_be_bytes());
        self.fields.extend(0u16.to_be_bytes());
        self.field_count += 1;

        let mut code = self.super_init();
        code.push(ALOAD_0);
        code.extend(self.ldc(value));
        code.push(PUTFIELD);
        code.extend(self.field_ref(field));
        code.push(RETURN);
        self.add_method(ACC_PUBLIC, "<init>", "()V", Some((code, 2)));
        self
    }

    /// `String <name><descriptor> { return "<value>"; }`
    pub fn method_returning(mut self, name: &str, descriptor: &str, value: &str) -> Self {
        let mut code = self.ldc(value);
        code.push(ARETURN);
        self.add_method(ACC_PUBLIC, name, descriptor, Some((code, 1)));
        self
    }

    pub fn get_name_literal(self, value: &str) -> Self {
        self.method_returning(GET_NAME, GET_NAME_DESCRIPTOR, value)
    }

    /// `if (false) return v0; ... return vN;`, one early return per value.
    pub fn get_name_branches(mut self, values: &[&str]) -> Self {
        let mut code = Vec::new();
        for (i, value) in values.iter().enumerate() {
            let load = self.ldc(value);
            if i + 1 < values.len() {
                // ifeq jumps over its own 3 bytes, the load and the areturn
                let skip = (3 + load.len() + 1) as i16;
                code.push(ICONST_0);
                code.push(IFEQ);
                code.extend(skip.to_be_bytes());
            }
            code.extend(load);
            code.push(ARETURN);
        }
        self.add_method(ACC_PUBLIC, GET_NAME, GET_NAME_DESCRIPTOR, Some((code, 1)));
        self
    }

    /// `return false ? first : second;`
    pub fn get_name_conditional(mut self, first: &str, second: &str) -> Self {
        let first = self.ldc(first);
        let second = self.ldc(second);
        let to_second = (3 + first.len() + 3) as i16;
        let to_return = (3 + second.len()) as i16;

        let mut code = vec![ICONST_0, IFEQ];
        code.extend(to_second.to_be_bytes());
        code.extend(first);
        code.push(GOTO);
        code.extend(to_return.to_be_bytes());
        code.extend(second);
        code.push(ARETURN);
        self.add_method(ACC_PUBLIC, GET_NAME, GET_NAME_DESCRIPTOR, Some((code, 1)));
        self
    }

    /// `return prefix + this.<field>;` as javac compiles it for Java 8 targets.
    pub fn get_name_concat(mut self, prefix: &str, field: &str) -> Self {
        let builder = self.class_ref(STRING_BUILDER);
        let init = self.member_ref(10, builder, "<init>", "()V").to_be_bytes();
        let append = self.member_ref(10, builder, "append", APPEND_DESCRIPTOR).to_be_bytes();
        let to_string = self
            .member_ref(10, builder, "toString", GET_NAME_DESCRIPTOR)
            .to_be_bytes();

        let mut code = vec![NEW];
        code.extend(builder.to_be_bytes());
        code.push(DUP);
        code.push(INVOKESPECIAL);
        code.extend(init);
        code.extend(self.ldc(prefix));
        code.push(INVOKEVIRTUAL);
        code.extend(append);
        code.push(ALOAD_0);
        code.push(GETFIELD);
        code.extend(self.field_ref(field));
        code.push(INVOKEVIRTUAL);
        code.extend(append);
        code.push(INVOKEVIRTUAL);
        code.extend(to_string);
        code.push(ARETURN);
        self.add_method(ACC_PUBLIC, GET_NAME, GET_NAME_DESCRIPTOR, Some((code, 3)));
        self
    }

    /// Static initializer doing `System.out.print(text)`.
    pub fn static_print(mut self, text: &str) -> Self {
        let system = self.class_ref("java/lang/System");
        let out = self
            .member_ref(9, system, "out", "Ljava/io/PrintStream;")
            .to_be_bytes();
        let stream = self.class_ref("java/io/PrintStream");
        let print = self
            .member_ref(10, stream, "print", "(Ljava/lang/String;)V")
            .to_be_bytes();

        let mut code = vec![GETSTATIC];
        code.extend(out);
        code.extend(self.ldc(text));
        code.push(INVOKEVIRTUAL);
        code.extend(print);
        code.push(RETURN);
        self.add_method(ACC_STATIC, "<clinit>", "()V", Some((code, 2)));
        self
    }

    pub fn get_name_from_field(mut self, field: &str) -> Self {
        let mut code = vec![ALOAD_0, GETFIELD];
        code.extend(self.field_ref(field));
        code.push(ARETURN);
        self.add_method(ACC_PUBLIC, GET_NAME, GET_NAME_DESCRIPTOR, Some((code, 1)));
        self
    }

    /// Loads an int constant, drops it and returns null.
    pub fn get_name_integer_constant(mut self, value: i32) -> Self {
        let index = self.integer(value);
        let code = vec![LDC, index as u8, POP, ACONST_NULL, ARETURN];
        self.add_method(ACC_PUBLIC, GET_NAME, GET_NAME_DESCRIPTOR, Some((code, 1)));
        self
    }

    pub fn abstract_get_name(mut self) -> Self {
        self.add_method(ACC_PUBLIC | ACC_ABSTRACT, GET_NAME, GET_NAME_DESCRIPTOR, None);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE];
        bytes.extend(0u16.to_be_bytes());
        bytes.extend(52u16.to_be_bytes());
        bytes.extend(self.next_index.to_be_bytes());
        bytes.extend(self.pool);
        bytes.extend((ACC_PUBLIC | ACC_SUPER).to_be_bytes());
        bytes.extend(self.this_class.to_be_bytes());
        bytes.extend(self.super_class.to_be_bytes());
        bytes.extend(0u16.to_be_bytes());
        bytes.extend(self.field_count.to_be_bytes());
        bytes.extend(self.fields);
        bytes.extend(self.method_count.to_be_bytes());
        bytes.extend(self.methods);
        bytes.extend(0u16.to_be_bytes());
        bytes
    }
}

/// Plugin whose `getName()` returns a literal.
pub fn literal_plugin(class_name: &str, name: &str) -> Vec<u8> {
    ClassBuilder::new(class_name)
        .default_constructor()
        .get_name_literal(name)
        .build()
}

/// Plugin whose `getName()` returns a field assigned in the constructor.
pub fn field_plugin(class_name: &str, value: &str) -> Vec<u8> {
    ClassBuilder::new(class_name)
        .constructor_setting_field("name", value)
        .get_name_from_field("name")
        .build()
}

#[derive(Default)]
pub struct JarBuilder {
    entries: Vec<(String, Vec<u8>)>,
    encrypted: Vec<String>,
}

impl JarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.push((name.to_string(), bytes.into()));
        self
    }

    /// AES encrypted entry; readable only with a password.
    pub fn encrypted_entry(mut self, name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.encrypted.push(name.to_string());
        self.entry(name, bytes)
    }

    pub fn descriptor(self, class_names: &[&str]) -> Self {
        let mut content = class_names.join("\n");
        content.push('\n');
        self.entry(PLUGIN_DESCRIPTOR, content)
    }

    pub fn class(self, class_name: &str, bytes: Vec<u8>) -> Self {
        let entry = class_name.replace('.', "/") + ".class";
        self.entry(&entry, bytes)
    }

    pub fn write(self, path: &Path) -> PathBuf {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        let options = zip::write::SimpleFileOptions::default();
        for (name, bytes) in &self.entries {
            let options = if self.encrypted.contains(name) {
                options.with_aes_encryption(zip::AesMode::Aes256, "password")
            } else {
                options
            };
            zip.start_file(name.as_str(), options).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
        path.to_path_buf()
    }
}

/// Stands in for the JVM: answers from a table and records every call.
#[derive(Default)]
pub struct RecordingRunner {
    answers: HashMap<String, Result<String, String>>,
    calls: Mutex<Vec<(PathBuf, String)>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, class_name: &str, name: &str) -> Self {
        self.answers
            .insert(class_name.to_string(), Ok(name.to_string()));
        self
    }

    pub fn fail(mut self, class_name: &str, reason: &str) -> Self {
        self.answers
            .insert(class_name.to_string(), Err(reason.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<(PathBuf, String)> {
        self.calls.lock().expect("lock poisoned").clone()
    }
}

impl ClassRunner for RecordingRunner {
    fn invoke_name(&self, artifact: &Path, class_name: &str) -> plugscan_core::Result<String> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push((artifact.to_path_buf(), class_name.to_string()));
        match self.answers.get(class_name) {
            Some(Ok(name)) => Ok(name.clone()),
            Some(Err(reason)) => Err(DiscoveryError::DynamicResolution {
                class_name: class_name.to_string(),
                artifact: artifact.to_path_buf(),
                reason: reason.clone(),
            }),
            None => Err(DiscoveryError::DynamicResolution {
                class_name: class_name.to_string(),
                artifact: artifact.to_path_buf(),
                reason: "java.lang.ClassNotFoundException".to_string(),
            }),
        }
    }
}

pub fn aggregator(config: ScanConfig, runner: Arc<RecordingRunner>) -> PluginNameAggregator {
    PluginNameAggregator::with_runner(config, runner, ResourceTracker::new())
}

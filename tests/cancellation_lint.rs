//! AST-level test to ensure every loop in an async fn can be cancelled.
//!
//! The receive task blocks on resolution, connect and each read. A loop in
//! async code that awaits without racing a shutdown signal would make
//! `KnobReader::stop()` hang until the peer sends or closes:
//! ```ignore
//! loop {
//!     let n = reader.read(&mut buf).await?; // stop() waits on the network
//! }
//! ```

use std::fs;
use std::path::Path;
use syn::visit::Visit;
use syn::{ExprLoop, ExprMacro, File, ImplItemFn, ItemFn, Macro, StmtMacro};
use walkdir::WalkDir;

struct AsyncLoopVisitor {
    current_file: String,
    /// Name of the enclosing async fn, if any
    async_fn: Option<String>,
    in_loop_depth: usize,
    has_select_in_loop: bool,
    violations: Vec<(String, String)>,
}

impl AsyncLoopVisitor {
    fn new(file: String) -> Self {
        Self {
            current_file: file,
            async_fn: None,
            in_loop_depth: 0,
            has_select_in_loop: false,
            violations: Vec::new(),
        }
    }

    fn is_select_macro_path(&self, mac: &Macro) -> bool {
        let path_str: String = mac
            .path
            .segments
            .iter()
            .map(|s| s.ident.to_string())
            .collect::<Vec<_>>()
            .join("::");
        path_str == "tokio::select" || path_str == "select"
    }

    fn with_fn<F: FnOnce(&mut Self)>(&mut self, name: Option<String>, f: F) {
        let old = std::mem::replace(&mut self.async_fn, name);
        f(self);
        self.async_fn = old;
    }
}

impl<'ast> Visit<'ast> for AsyncLoopVisitor {
    fn visit_item_fn(&mut self, item: &'ast ItemFn) {
        let name = item.sig.asyncness.map(|_| item.sig.ident.to_string());
        self.with_fn(name, |v| syn::visit::visit_item_fn(v, item));
    }

    fn visit_impl_item_fn(&mut self, item: &'ast ImplItemFn) {
        let name = item.sig.asyncness.map(|_| item.sig.ident.to_string());
        self.with_fn(name, |v| syn::visit::visit_impl_item_fn(v, item));
    }

    fn visit_expr_loop(&mut self, loop_expr: &'ast ExprLoop) {
        let Some(fn_name) = self.async_fn.clone() else {
            syn::visit::visit_expr_loop(self, loop_expr);
            return;
        };

        self.in_loop_depth += 1;
        let old_has_select = self.has_select_in_loop;
        self.has_select_in_loop = false;

        syn::visit::visit_expr_loop(self, loop_expr);

        if !self.has_select_in_loop {
            self.violations.push((
                self.current_file.clone(),
                format!("loop in async fn `{}` without tokio::select!", fn_name),
            ));
        }

        self.has_select_in_loop = old_has_select;
        self.in_loop_depth -= 1;
    }

    fn visit_expr_macro(&mut self, mac: &'ast ExprMacro) {
        if self.in_loop_depth > 0 && self.is_select_macro_path(&mac.mac) {
            self.has_select_in_loop = true;
        }
        syn::visit::visit_expr_macro(self, mac);
    }

    fn visit_stmt_macro(&mut self, mac: &'ast StmtMacro) {
        if self.in_loop_depth > 0 && self.is_select_macro_path(&mac.mac) {
            self.has_select_in_loop = true;
        }
        syn::visit::visit_stmt_macro(self, mac);
    }
}

fn analyze_file(path: &Path) -> Vec<(String, String)> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return vec![],
    };

    let syntax: File = match syn::parse_file(&content) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
            return vec![];
        }
    };

    let mut visitor = AsyncLoopVisitor::new(path.display().to_string());
    visitor.visit_file(&syntax);
    visitor.violations
}

#[test]
fn async_loops_must_race_shutdown() {
    let src_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");

    let mut all_violations = Vec::new();
    for entry in WalkDir::new(&src_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
    {
        all_violations.extend(analyze_file(entry.path()));
    }

    if !all_violations.is_empty() {
        let mut error_msg = String::from(
            "\n\nFound async loops without cancellation handling!\n\
             KnobReader::stop() cannot interrupt these.\n\n\
             Violations:\n",
        );
        for (file, context) in &all_violations {
            error_msg.push_str(&format!("  - {}: {}\n", file, context));
        }
        panic!("{}", error_msg);
    }
}

#[test]
fn visitor_flags_bare_read_loop() {
    let src = r#"
        async fn pump(reader: &mut R) {
            loop {
                reader.read(&mut buf).await;
            }
        }
        fn sync_spin() {
            loop {}
        }
    "#;
    let syntax: File = syn::parse_file(src).unwrap();
    let mut visitor = AsyncLoopVisitor::new("inline".to_string());
    visitor.visit_file(&syntax);

    assert_eq!(visitor.violations.len(), 1);
    assert!(visitor.violations[0].1.contains("pump"));
}

//! Source-to-source rewriter that migrates SWR data-fetching call sites,
//! cache-handle usage, provider elements, and config exports to their
//! TanStack React Query equivalents. Operates on one parsed module at a
//! time; performs no I/O of its own.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use swc_core::{
    atoms::Atom,
    common::{
        comments::{Comment, CommentKind, Comments, SingleThreadedComments},
        sync::Lrc,
        FileName, SourceMap, Span, Spanned, SyntaxContext, DUMMY_SP,
    },
    ecma::{
        ast::*,
        codegen::{text_writer::JsWriter, Config, Emitter},
        parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax},
        visit::{Visit, VisitMut, VisitMutWith, VisitWith},
    },
};

// -----------------------------------------------------------------------------
// Library identifiers & option tables
// -----------------------------------------------------------------------------

const SWR_MODULE: &str = "swr";
const QUERY_MODULE: &str = "@tanstack/react-query";

/// Source-path fragment identifying the project-local config re-export module
/// (`import { swrConfig } from '../lib/swrConfig'`).
const LOCAL_ADAPTER_FRAGMENT: &str = "swrConfig";

/// Options that rename one-to-one between the two hook APIs. The value
/// expression is carried over untouched.
const OPTION_RENAMES: &[(&str, &str)] = &[
    ("refreshInterval", "refetchInterval"),
    ("revalidateOnFocus", "refetchOnWindowFocus"),
    ("revalidateOnReconnect", "refetchOnReconnect"),
    ("revalidateOnMount", "refetchOnMount"),
    ("errorRetryCount", "retry"),
    ("errorRetryInterval", "retryDelay"),
    ("fallbackData", "initialData"),
    ("dedupingInterval", "staleTime"),
];

/// Options with no target equivalent at all; dropped from rewritten calls.
const DROPPED_OPTIONS: &[&str] = &["loadingTimeout", "focusThrottleInterval"];

const REVIEW_MARKER: &str =
    " swr-migrate: mutate() received a third argument with no React Query equivalent; review manually";

fn rename_option(name: &str) -> Option<&'static str> {
    OPTION_RENAMES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
}

fn is_dropped_option(name: &str) -> bool {
    DROPPED_OPTIONS.contains(&name)
}

// -----------------------------------------------------------------------------
// Public surface
// -----------------------------------------------------------------------------

/// Result of migrating one module.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Rewritten source text, or the input verbatim when nothing matched.
    pub code: String,
    pub changed: bool,
    pub report: MigrationReport,
}

/// Per-file summary of what the rewriter touched, for outer batch drivers.
#[derive(Debug, Default, Clone, Serialize)]
pub struct MigrationReport {
    pub hook_calls: usize,
    pub renamed_refs: usize,
    pub cache_handles: usize,
    pub cache_calls: usize,
    pub review_markers: usize,
    pub providers: usize,
    pub config_exports: usize,
    pub alias_renames: usize,
}

impl MigrationReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
    }
}

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },
    #[error("failed to emit rewritten module: {0}")]
    Emit(String),
}

/// Migrate one module from SWR to React Query.
///
/// `file_name` is used only for diagnostics. A module that never touches the
/// origin library is returned character-for-character unchanged. Shapes the
/// rewriter does not recognize are left in place rather than failing the
/// whole pass; the one construct that cannot be translated mechanically (a
/// third `mutate` argument) gets a leading review-marker comment instead.
pub fn migrate_source(file_name: &str, source: &str) -> Result<Migration, MigrateError> {
    let (mut module, cm, comments) = parse_module_text(file_name, source)?;

    let mut caps = Capabilities::default();
    module.visit_with(&mut ImportScan { caps: &mut caps });

    if !caps.any() {
        debug!(file = file_name, "no origin-library usage, returning input unchanged");
        return Ok(Migration {
            code: source.to_string(),
            changed: false,
            report: MigrationReport::default(),
        });
    }

    let mut report = MigrationReport::default();

    if let Some(hook_local) = caps.swr_hook_local.clone() {
        // Collect `mutate` bindings before any rewriting: the call-site pass
        // changes the very pattern shapes this scan matches on.
        let mut tracked: HashSet<Atom> = HashSet::new();
        module.visit_with(&mut MutateBindingTracker {
            hook_local: &hook_local,
            tracked: &mut tracked,
        });

        let mut calls = CallSiteRewriter {
            hook_local,
            rewritten: 0,
        };
        module.visit_mut_with(&mut calls);
        report.hook_calls = calls.rewritten;

        if !tracked.is_empty() {
            let mut rename = RefetchRename {
                tracked: &tracked,
                renamed: 0,
            };
            module.visit_mut_with(&mut rename);
            report.renamed_refs = rename.renamed;
        }
        debug!(
            file = file_name,
            calls = report.hook_calls,
            renames = report.renamed_refs,
            "rewrote primary hook call sites"
        );
    }

    if let Some(config_hook) = caps.config_hook_local.clone() {
        let mut handles = ConfigHandleCollector {
            config_hook,
            handles: HashSet::new(),
            replaced: 0,
        };
        module.visit_mut_with(&mut handles);
        report.cache_handles = handles.replaced;

        if !handles.handles.is_empty() {
            let mut cache = CacheCallRewriter {
                handles: &handles.handles,
                comments: &comments,
                current_stmt: None,
                rewritten: 0,
                review_markers: 0,
            };
            module.visit_mut_with(&mut cache);
            report.cache_calls = cache.rewritten;
            report.review_markers = cache.review_markers;
        }
        debug!(
            file = file_name,
            handles = report.cache_handles,
            calls = report.cache_calls,
            "rewrote cache-handle usage"
        );
    }

    if let Some(provider_local) = caps.provider_local.clone() {
        let mut provider = ProviderRewriter {
            provider_local,
            rewritten: 0,
        };
        module.visit_mut_with(&mut provider);
        report.providers = provider.rewritten;
    }

    if caps.has_config_export {
        let mut exports = ConfigExportRewriter { rewritten: 0 };
        module.visit_mut_with(&mut exports);
        report.config_exports = exports.rewritten;
    }

    if caps.has_local_config_alias {
        let mut alias = AliasRewriter { renamed: 0 };
        module.visit_mut_with(&mut alias);
        report.alias_renames = alias.renamed;
    }

    consolidate_imports(&mut module, &caps);

    let code = print_module(&cm, &comments, &module)?;
    debug!(file = file_name, "migration complete");
    Ok(Migration {
        code,
        changed: true,
        report,
    })
}

// -----------------------------------------------------------------------------
// Parse & print plumbing
// -----------------------------------------------------------------------------

fn parse_module_text(
    file_name: &str,
    source: &str,
) -> Result<(Module, Lrc<SourceMap>, SingleThreadedComments), MigrateError> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        Lrc::new(FileName::Custom(file_name.into())),
        source.to_string(),
    );
    let comments = SingleThreadedComments::default();

    let module = {
        let lexer = Lexer::new(
            Syntax::Es(EsSyntax {
                jsx: true,
                ..Default::default()
            }),
            Default::default(),
            StringInput::from(&*fm),
            Some(&comments),
        );
        let mut parser = Parser::new_from(lexer);
        let module = match parser.parse_module() {
            Ok(module) => module,
            Err(err) => {
                return Err(MigrateError::Parse {
                    file: file_name.to_string(),
                    message: err.kind().msg().to_string(),
                });
            }
        };
        if let Some(err) = parser.take_errors().into_iter().next() {
            return Err(MigrateError::Parse {
                file: file_name.to_string(),
                message: err.kind().msg().to_string(),
            });
        }
        module
    };

    Ok((module, cm, comments))
}

/// Serialize the (possibly mutated) module back to text. Comments collected
/// at parse time ride along, so file headers and inline notes survive the
/// rewrite. An empty module prints as the empty string.
fn print_module(
    cm: &Lrc<SourceMap>,
    comments: &SingleThreadedComments,
    module: &Module,
) -> Result<String, MigrateError> {
    let mut buf = Vec::new();
    {
        let writer = JsWriter::new(cm.clone(), "\n", &mut buf, None);
        let mut emitter = Emitter {
            cfg: Config::default(),
            comments: Some(comments),
            cm: cm.clone(),
            wr: writer,
        };
        emitter
            .emit_module(module)
            .map_err(|err| MigrateError::Emit(err.to_string()))?;
    }
    String::from_utf8(buf).map_err(|err| MigrateError::Emit(err.to_string()))
}

// -----------------------------------------------------------------------------
// Capability flags (import scanner)
// -----------------------------------------------------------------------------

/// What the module imports/exports from the origin library, computed once
/// up front. Later stages only run when their flag is set and never write
/// back into this.
#[derive(Default, Clone)]
struct Capabilities {
    /// Local binding of the default (primary hook) import, any alias.
    swr_hook_local: Option<Atom>,
    /// Local binding of the `useSWRConfig` named import.
    config_hook_local: Option<Atom>,
    /// Local binding of the `SWRConfig` named import.
    provider_local: Option<Atom>,
    has_local_config_alias: bool,
    has_config_export: bool,
}

impl Capabilities {
    fn any(&self) -> bool {
        self.swr_hook_local.is_some()
            || self.config_hook_local.is_some()
            || self.provider_local.is_some()
            || self.has_local_config_alias
            || self.has_config_export
    }
}

struct ImportScan<'a> {
    caps: &'a mut Capabilities,
}

impl Visit for ImportScan<'_> {
    fn visit_import_decl(&mut self, n: &ImportDecl) {
        if n.src.value.as_ref() == SWR_MODULE {
            for s in &n.specifiers {
                match s {
                    ImportSpecifier::Default(def) => {
                        self.caps.swr_hook_local = Some(def.local.sym.clone());
                    }
                    ImportSpecifier::Named(named) => {
                        let external = external_name(named);
                        if external.as_ref() == "useSWRConfig" {
                            self.caps.config_hook_local = Some(named.local.sym.clone());
                        } else if external.as_ref() == "SWRConfig" {
                            self.caps.provider_local = Some(named.local.sym.clone());
                        }
                    }
                    ImportSpecifier::Namespace(_) => {}
                }
            }
        } else if n.src.value.as_ref().contains(LOCAL_ADAPTER_FRAGMENT) {
            for s in &n.specifiers {
                if let ImportSpecifier::Named(named) = s {
                    if external_name(named).as_ref() == "swrConfig"
                        || named.local.sym.as_ref() == "swrConfig"
                    {
                        self.caps.has_local_config_alias = true;
                    }
                }
            }
        }
        n.visit_children_with(self);
    }

    fn visit_export_decl(&mut self, n: &ExportDecl) {
        if let Decl::Var(v) = &n.decl {
            for d in &v.decls {
                if let (Pat::Ident(binding), Some(init)) = (&d.name, &d.init) {
                    if binding.id.sym.as_ref() == "swrConfig" && matches!(&**init, Expr::Object(_))
                    {
                        self.caps.has_config_export = true;
                    }
                }
            }
        }
        n.visit_children_with(self);
    }
}

fn external_name(named: &ImportNamedSpecifier) -> Atom {
    named
        .imported
        .as_ref()
        .map(|name| match name {
            ModuleExportName::Ident(i) => i.sym.clone(),
            ModuleExportName::Str(s) => s.value.clone(),
        })
        .unwrap_or_else(|| named.local.sym.clone())
}

// -----------------------------------------------------------------------------
// Mutate-binding tracker
// -----------------------------------------------------------------------------

/// Records the local names bound to the `mutate` field when destructuring a
/// primary-hook result, aliased or shorthand, anywhere in the file. The set
/// only grows; the rename pass consumes it after call-site rewriting.
struct MutateBindingTracker<'a> {
    hook_local: &'a Atom,
    tracked: &'a mut HashSet<Atom>,
}

impl Visit for MutateBindingTracker<'_> {
    fn visit_var_declarator(&mut self, d: &VarDeclarator) {
        d.visit_children_with(self);

        if !declarator_inits_call_to(d, self.hook_local) {
            return;
        }
        if let Pat::Object(pat) = &d.name {
            for prop in &pat.props {
                match prop {
                    ObjectPatProp::Assign(a) if a.key.id.sym.as_ref() == "mutate" => {
                        self.tracked.insert(a.key.id.sym.clone());
                    }
                    ObjectPatProp::KeyValue(kv) => {
                        let keyed_mutate =
                            matches!(&kv.key, PropName::Ident(k) if k.sym.as_ref() == "mutate");
                        if keyed_mutate {
                            if let Pat::Ident(binding) = &*kv.value {
                                self.tracked.insert(binding.id.sym.clone());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

fn declarator_inits_call_to(d: &VarDeclarator, name: &Atom) -> bool {
    match &d.init {
        Some(init) => match &**init {
            Expr::Call(call) => is_ident_callee(call, name),
            _ => false,
        },
        None => false,
    }
}

fn is_ident_callee(call: &CallExpr, name: &Atom) -> bool {
    match &call.callee {
        Callee::Expr(callee) => matches!(&**callee, Expr::Ident(i) if i.sym == *name),
        _ => false,
    }
}

// -----------------------------------------------------------------------------
// Call-site rewriter (useSWR(..) -> useQuery({..}))
// -----------------------------------------------------------------------------

struct CallSiteRewriter {
    hook_local: Atom,
    rewritten: usize,
}

impl VisitMut for CallSiteRewriter {
    fn visit_mut_var_declarator(&mut self, d: &mut VarDeclarator) {
        // The pattern rename keys off the pre-rewrite call shape, so it has
        // to happen before children are visited.
        let rewritable = match &d.init {
            Some(init) => match &**init {
                Expr::Call(call) => {
                    is_ident_callee(call, &self.hook_local) && call.args.len() >= 2
                }
                _ => false,
            },
            None => false,
        };
        if rewritable {
            if let Pat::Object(pat) = &mut d.name {
                rename_result_pattern(pat);
            }
        }
        d.visit_mut_children_with(self);
    }

    fn visit_mut_call_expr(&mut self, call: &mut CallExpr) {
        call.visit_mut_children_with(self);

        if !is_ident_callee(call, &self.hook_local) || call.args.len() < 2 {
            return;
        }
        // A spread in any consumed position makes the (key, fn, options)
        // triple unrecoverable; leave the call alone.
        if call.args.iter().take(3).any(|a| a.spread.is_some()) {
            return;
        }

        let mut args = std::mem::take(&mut call.args);
        let options = if args.len() >= 3 {
            Some(args.remove(2).expr)
        } else {
            None
        };
        let revalidator = args.remove(1).expr;
        let key = args.remove(0).expr;

        let (query_key, enabled) = split_conditional_key(key);
        let query_fn = adapt_revalidator(revalidator);

        let mut props: Vec<PropOrSpread> = vec![
            key_value_prop("queryKey", Box::new(single_array(query_key))),
            key_value_prop("queryFn", query_fn),
        ];
        if let Some(test) = enabled {
            props.push(key_value_prop("enabled", test));
        }
        if let Some(options) = options {
            if let Expr::Object(obj) = *options {
                props.extend(map_hook_options(obj.props));
            }
        }

        call.callee = Callee::Expr(Box::new(Expr::Ident(ident("useQuery"))));
        call.args = vec![as_arg(Box::new(Expr::Object(ObjectLit {
            span: DUMMY_SP,
            props,
        })))];
        call.type_args = None;
        self.rewritten += 1;
    }
}

/// `test ? key : null` (also `undefined` / `false`) carries conditional-fetch
/// intent: the consequent becomes the query key, the test becomes `enabled`.
fn split_conditional_key(key: Box<Expr>) -> (Box<Expr>, Option<Box<Expr>>) {
    match *key {
        Expr::Cond(cond) if is_absent_key(&cond.alt) => (cond.cons, Some(cond.test)),
        other => (Box::new(other), None),
    }
}

fn is_absent_key(expr: &Expr) -> bool {
    match expr {
        Expr::Lit(Lit::Null(_)) => true,
        Expr::Lit(Lit::Bool(b)) => !b.value,
        Expr::Ident(i) => i.sym.as_ref() == "undefined",
        _ => false,
    }
}

/// A function-valued revalidator is passed through as `queryFn`. Anything
/// else is assumed callable with the raw key and adapted to the array-shaped
/// composite key: `({ queryKey }) => revalidator(queryKey[0])`. A `null` or
/// `undefined` revalidator gets the same wrapper and will throw if invoked,
/// matching the behavior of the call it replaces.
fn adapt_revalidator(revalidator: Box<Expr>) -> Box<Expr> {
    if matches!(&*revalidator, Expr::Arrow(_) | Expr::Fn(_)) {
        return revalidator;
    }

    let key_member = Expr::Member(MemberExpr {
        span: DUMMY_SP,
        obj: Box::new(Expr::Ident(ident("queryKey"))),
        prop: MemberProp::Computed(ComputedPropName {
            span: DUMMY_SP,
            expr: Box::new(Expr::Lit(Lit::Num(Number {
                span: DUMMY_SP,
                value: 0.0,
                raw: None,
            }))),
        }),
    });

    Box::new(Expr::Arrow(ArrowExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        params: vec![Pat::Object(ObjectPat {
            span: DUMMY_SP,
            optional: false,
            type_ann: None,
            props: vec![ObjectPatProp::Assign(AssignPatProp {
                span: DUMMY_SP,
                key: ident("queryKey").into(),
                value: None,
            })],
        })],
        body: Box::new(BlockStmtOrExpr::Expr(Box::new(Expr::Call(CallExpr {
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            callee: Callee::Expr(revalidator),
            args: vec![as_arg(Box::new(key_member))],
            type_args: None,
        })))),
        is_async: false,
        is_generator: false,
        type_params: None,
        return_type: None,
    }))
}

/// Lenient option mapping for rewritten hook calls: table hits are renamed,
/// the drop-set vanishes, `keepPreviousData` becomes an identity
/// `placeholderData`, and everything else (spreads, computed keys, unknown
/// names) passes through verbatim, order preserved.
fn map_hook_options(props: Vec<PropOrSpread>) -> Vec<PropOrSpread> {
    let mut out = Vec::with_capacity(props.len());
    for prop in props {
        match prop {
            PropOrSpread::Prop(p) => match *p {
                Prop::KeyValue(kv) => {
                    let name = literal_prop_name(&kv.key);
                    match name.as_deref() {
                        Some("keepPreviousData") => out.push(placeholder_data_prop()),
                        Some(n) if is_dropped_option(n) => {}
                        Some(n) => match rename_option(n) {
                            Some(renamed) => out.push(key_value_prop(renamed, kv.value)),
                            None => out.push(PropOrSpread::Prop(Box::new(Prop::KeyValue(kv)))),
                        },
                        None => out.push(PropOrSpread::Prop(Box::new(Prop::KeyValue(kv)))),
                    }
                }
                Prop::Shorthand(id) => {
                    if id.sym.as_ref() == "keepPreviousData" {
                        out.push(placeholder_data_prop());
                    } else if is_dropped_option(id.sym.as_ref()) {
                    } else if let Some(renamed) = rename_option(id.sym.as_ref()) {
                        out.push(key_value_prop(renamed, Box::new(Expr::Ident(id))));
                    } else {
                        out.push(PropOrSpread::Prop(Box::new(Prop::Shorthand(id))));
                    }
                }
                other => out.push(PropOrSpread::Prop(Box::new(other))),
            },
            spread => out.push(spread),
        }
    }
    out
}

/// Strict option mapping for client default options: `fetcher` is dropped,
/// table hits are renamed, and anything absent from the table is omitted.
fn map_client_defaults(props: Vec<PropOrSpread>) -> Vec<PropOrSpread> {
    let mut out = Vec::new();
    for prop in props {
        let (name, value) = match prop {
            PropOrSpread::Prop(p) => match *p {
                Prop::KeyValue(kv) => match literal_prop_name(&kv.key) {
                    Some(name) => (name, kv.value),
                    None => continue,
                },
                Prop::Shorthand(id) => {
                    let name = id.sym.to_string();
                    (name, Box::new(Expr::Ident(id)))
                }
                _ => continue,
            },
            PropOrSpread::Spread(_) => continue,
        };
        if let Some(renamed) = rename_option(&name) {
            out.push(key_value_prop(renamed, value));
        }
    }
    out
}

fn literal_prop_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(i) => Some(i.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        _ => None,
    }
}

/// `placeholderData: (previousData) => previousData`
fn placeholder_data_prop() -> PropOrSpread {
    key_value_prop(
        "placeholderData",
        Box::new(Expr::Arrow(ArrowExpr {
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            params: vec![Pat::Ident(ident("previousData").into())],
            body: Box::new(BlockStmtOrExpr::Expr(Box::new(Expr::Ident(ident(
                "previousData",
            ))))),
            is_async: false,
            is_generator: false,
            type_params: None,
            return_type: None,
        })),
    )
}

/// The destructuring keys of a rewritten call now read the target hook's
/// result fields: `mutate` -> `refetch`, `isValidating` -> `isFetching`
/// (shorthand renames the bound local along with the key).
fn rename_result_pattern(pat: &mut ObjectPat) {
    for prop in pat.props.iter_mut() {
        match prop {
            ObjectPatProp::KeyValue(kv) => {
                if let PropName::Ident(key) = &mut kv.key {
                    if key.sym.as_ref() == "mutate" {
                        *key = IdentName::new("refetch".into(), key.span);
                    } else if key.sym.as_ref() == "isValidating" {
                        *key = IdentName::new("isFetching".into(), key.span);
                    }
                }
            }
            ObjectPatProp::Assign(a) => {
                if a.key.id.sym.as_ref() == "isValidating" {
                    a.key.id.sym = "isFetching".into();
                }
            }
            ObjectPatProp::Rest(_) => {}
        }
    }
}

// -----------------------------------------------------------------------------
// Tracked-handle rename (mutate -> refetch)
// -----------------------------------------------------------------------------

/// Whole-file, name-based rename of tracked revalidate handles to `refetch`.
/// Not scope-aware. Skipped positions: import specifiers (the external name
/// is not ours to change) and non-shorthand pattern/object keys, which the
/// visitor never reaches because they are `IdentName`s. Shorthand object
/// literal properties are expanded so the outward-visible key survives.
struct RefetchRename<'a> {
    tracked: &'a HashSet<Atom>,
    renamed: usize,
}

impl VisitMut for RefetchRename<'_> {
    fn visit_mut_ident(&mut self, i: &mut Ident) {
        if self.tracked.contains(&i.sym) {
            i.sym = "refetch".into();
            self.renamed += 1;
        }
    }

    fn visit_mut_import_specifier(&mut self, _n: &mut ImportSpecifier) {}

    fn visit_mut_prop(&mut self, p: &mut Prop) {
        if let Prop::Shorthand(id) = p {
            if self.tracked.contains(&id.sym) {
                let key = IdentName::new(id.sym.clone(), id.span);
                *p = Prop::KeyValue(KeyValueProp {
                    key: PropName::Ident(key),
                    value: Box::new(Expr::Ident(ident("refetch"))),
                });
                self.renamed += 1;
                return;
            }
        }
        p.visit_mut_children_with(self);
    }

    fn visit_mut_object_pat(&mut self, pat: &mut ObjectPat) {
        pat.visit_mut_children_with(self);

        // `{ refetch: refetch }` reads better as shorthand once both sides
        // of an aliased `mutate` binding have been renamed.
        for prop in pat.props.iter_mut() {
            let collapse = match prop {
                ObjectPatProp::KeyValue(kv) => match (&kv.key, &*kv.value) {
                    (PropName::Ident(k), Pat::Ident(v))
                        if k.sym.as_ref() == "refetch" && v.id.sym.as_ref() == "refetch" =>
                    {
                        Some(v.clone())
                    }
                    _ => None,
                },
                _ => None,
            };
            if let Some(binding) = collapse {
                *prop = ObjectPatProp::Assign(AssignPatProp {
                    span: binding.id.span,
                    key: binding,
                    value: None,
                });
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Config-hook rewriter (useSWRConfig -> useQueryClient)
// -----------------------------------------------------------------------------

/// Pass 1: replace `const { mutate } = useSWRConfig()` declarators with
/// `const queryClient = useQueryClient()`, collecting the handle names for
/// the call rewrite below. Other destructured fields have no target
/// equivalent and vanish with the declarator.
struct ConfigHandleCollector {
    config_hook: Atom,
    handles: HashSet<Atom>,
    replaced: usize,
}

impl VisitMut for ConfigHandleCollector {
    fn visit_mut_var_declarator(&mut self, d: &mut VarDeclarator) {
        d.visit_mut_children_with(self);

        if !declarator_inits_call_to(d, &self.config_hook) {
            return;
        }
        let mut matched = false;
        if let Pat::Object(pat) = &d.name {
            matched = true;
            for prop in &pat.props {
                match prop {
                    ObjectPatProp::Assign(a) if a.key.id.sym.as_ref() == "mutate" => {
                        self.handles.insert(a.key.id.sym.clone());
                    }
                    ObjectPatProp::KeyValue(kv) => {
                        let keyed_mutate =
                            matches!(&kv.key, PropName::Ident(k) if k.sym.as_ref() == "mutate");
                        if keyed_mutate {
                            if let Pat::Ident(binding) = &*kv.value {
                                self.handles.insert(binding.id.sym.clone());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        if !matched {
            return;
        }

        d.name = Pat::Ident(ident("queryClient").into());
        d.init = Some(Box::new(Expr::Call(CallExpr {
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            callee: Callee::Expr(Box::new(Expr::Ident(ident("useQueryClient")))),
            args: vec![],
            type_args: None,
        })));
        self.replaced += 1;
    }
}

/// Pass 2: rewrite calls through the collected handles.
///
/// - `mutate()` stays as-is: a bare revalidate-everything has no direct
///   client-method translation.
/// - `mutate(key)` becomes `queryClient.invalidateQueries({ queryKey: [key] })`.
/// - `mutate(key, data, ..)` becomes a `setQueryData` / `invalidateQueries`
///   sequence; a third argument is dropped and flagged with a review comment
///   on the enclosing statement rather than guessed at.
///
/// A bare handle reference left inside an array literal (dependency arrays)
/// is renamed to `queryClient`.
struct CacheCallRewriter<'a> {
    handles: &'a HashSet<Atom>,
    comments: &'a SingleThreadedComments,
    current_stmt: Option<Span>,
    rewritten: usize,
    review_markers: usize,
}

impl VisitMut for CacheCallRewriter<'_> {
    fn visit_mut_stmt(&mut self, s: &mut Stmt) {
        let prev = self.current_stmt;
        self.current_stmt = Some(s.span());
        s.visit_mut_children_with(self);
        self.current_stmt = prev;
    }

    fn visit_mut_expr(&mut self, e: &mut Expr) {
        e.visit_mut_children_with(self);

        let call = match e {
            Expr::Call(call) => call,
            _ => return,
        };
        let is_handle_call = match &call.callee {
            Callee::Expr(callee) => {
                matches!(&**callee, Expr::Ident(i) if self.handles.contains(&i.sym))
            }
            _ => false,
        };
        if !is_handle_call || call.args.is_empty() {
            return;
        }
        if call.args.iter().any(|a| a.spread.is_some()) {
            return;
        }

        let mut args = std::mem::take(&mut call.args);
        let key = args.remove(0).expr;
        if args.is_empty() {
            *e = invalidate_queries(key);
        } else {
            let data = args.remove(0).expr;
            if !args.is_empty() {
                if let Some(span) = self.current_stmt {
                    if !span.is_dummy() {
                        self.comments.add_leading(
                            span.lo(),
                            Comment {
                                kind: CommentKind::Line,
                                span: DUMMY_SP,
                                text: REVIEW_MARKER.into(),
                            },
                        );
                    }
                }
                self.review_markers += 1;
            }
            *e = Expr::Seq(SeqExpr {
                span: DUMMY_SP,
                exprs: vec![
                    Box::new(set_query_data(key.clone(), data)),
                    Box::new(invalidate_queries(key)),
                ],
            });
        }
        self.rewritten += 1;
    }

    fn visit_mut_array_lit(&mut self, arr: &mut ArrayLit) {
        arr.visit_mut_children_with(self);

        for elem in arr.elems.iter_mut().flatten() {
            if elem.spread.is_some() {
                continue;
            }
            if let Expr::Ident(i) = &mut *elem.expr {
                if self.handles.contains(&i.sym) {
                    i.sym = "queryClient".into();
                }
            }
        }
    }
}

fn invalidate_queries(key: Box<Expr>) -> Expr {
    let filter = ObjectLit {
        span: DUMMY_SP,
        props: vec![key_value_prop("queryKey", Box::new(single_array(key)))],
    };
    client_method_call(
        "invalidateQueries",
        vec![as_arg(Box::new(Expr::Object(filter)))],
    )
}

fn set_query_data(key: Box<Expr>, data: Box<Expr>) -> Expr {
    client_method_call(
        "setQueryData",
        vec![as_arg(Box::new(single_array(key))), as_arg(data)],
    )
}

fn client_method_call(method: &str, args: Vec<ExprOrSpread>) -> Expr {
    Expr::Call(CallExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        callee: Callee::Expr(Box::new(Expr::Member(MemberExpr {
            span: DUMMY_SP,
            obj: Box::new(Expr::Ident(ident("queryClient"))),
            prop: MemberProp::Ident(ident_name(method)),
        }))),
        args,
        type_args: None,
    })
}

// -----------------------------------------------------------------------------
// JSX provider rewriter (<SWRConfig value={..}> -> <QueryClientProvider ..>)
// -----------------------------------------------------------------------------

/// Renames the provider element and swaps its `value` attribute for
/// `client={queryClient}`. The original value expression is discarded; the
/// client instance comes from the rewritten config export (or is constructed
/// by hand where none existed).
struct ProviderRewriter {
    provider_local: Atom,
    rewritten: usize,
}

impl VisitMut for ProviderRewriter {
    fn visit_mut_jsx_element(&mut self, node: &mut JSXElement) {
        node.visit_mut_children_with(self);

        let is_provider = matches!(
            &node.opening.name,
            JSXElementName::Ident(id) if id.sym == self.provider_local
        );
        if !is_provider {
            return;
        }

        node.opening.name = JSXElementName::Ident(ident("QueryClientProvider").into());
        if let Some(closing) = &mut node.closing {
            closing.name = JSXElementName::Ident(ident("QueryClientProvider").into());
        }

        for attr in node.opening.attrs.iter_mut() {
            if let JSXAttrOrSpread::JSXAttr(a) = attr {
                let is_value =
                    matches!(&a.name, JSXAttrName::Ident(n) if n.sym.as_ref() == "value");
                if is_value {
                    a.name = JSXAttrName::Ident(ident_name("client"));
                    a.value = Some(JSXAttrValue::JSXExprContainer(JSXExprContainer {
                        span: DUMMY_SP,
                        expr: JSXExpr::Expr(Box::new(Expr::Ident(ident("queryClient")))),
                    }));
                }
            }
        }
        self.rewritten += 1;
    }
}

// -----------------------------------------------------------------------------
// Export & alias adapters
// -----------------------------------------------------------------------------

/// `export const swrConfig = {..}` becomes an exported `queryClient`
/// constructed with the strictly mapped options under
/// `defaultOptions.queries`.
struct ConfigExportRewriter {
    rewritten: usize,
}

impl VisitMut for ConfigExportRewriter {
    fn visit_mut_export_decl(&mut self, n: &mut ExportDecl) {
        if let Decl::Var(v) = &mut n.decl {
            for d in v.decls.iter_mut() {
                let is_config = match (&d.name, &d.init) {
                    (Pat::Ident(binding), Some(init)) => {
                        binding.id.sym.as_ref() == "swrConfig"
                            && matches!(&**init, Expr::Object(_))
                    }
                    _ => false,
                };
                if !is_config {
                    continue;
                }
                if let Pat::Ident(binding) = &mut d.name {
                    binding.id.sym = "queryClient".into();
                }
                if let Some(init) = d.init.take() {
                    if let Expr::Object(obj) = *init {
                        d.init = Some(Box::new(query_client_ctor(obj.props)));
                    }
                }
                self.rewritten += 1;
            }
        }
    }
}

/// `new QueryClient({ defaultOptions: { queries: { .. } } })`
fn query_client_ctor(props: Vec<PropOrSpread>) -> Expr {
    let queries = ObjectLit {
        span: DUMMY_SP,
        props: map_client_defaults(props),
    };
    let defaults = ObjectLit {
        span: DUMMY_SP,
        props: vec![key_value_prop("queries", Box::new(Expr::Object(queries)))],
    };
    let config = ObjectLit {
        span: DUMMY_SP,
        props: vec![key_value_prop(
            "defaultOptions",
            Box::new(Expr::Object(defaults)),
        )],
    };
    Expr::New(NewExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        callee: Box::new(Expr::Ident(ident("QueryClient"))),
        args: Some(vec![as_arg(Box::new(Expr::Object(config)))]),
        type_args: None,
    })
}

/// Renames the project-local `swrConfig` re-export binding and every free
/// reference to it. Import specifiers of unrelated modules and object
/// property keys keep their names; shorthand object properties are expanded
/// so only the value side changes.
struct AliasRewriter {
    renamed: usize,
}

impl VisitMut for AliasRewriter {
    fn visit_mut_import_decl(&mut self, n: &mut ImportDecl) {
        if !n.src.value.as_ref().contains(LOCAL_ADAPTER_FRAGMENT) {
            return;
        }
        for spec in n.specifiers.iter_mut() {
            if let ImportSpecifier::Named(named) = spec {
                if external_name(named).as_ref() == "swrConfig"
                    || named.local.sym.as_ref() == "swrConfig"
                {
                    named.local = ident("queryClient");
                    named.imported = None;
                    self.renamed += 1;
                }
            }
        }
    }

    fn visit_mut_ident(&mut self, i: &mut Ident) {
        if i.sym.as_ref() == "swrConfig" {
            i.sym = "queryClient".into();
            self.renamed += 1;
        }
    }

    fn visit_mut_prop(&mut self, p: &mut Prop) {
        if let Prop::Shorthand(id) = p {
            if id.sym.as_ref() == "swrConfig" {
                let key = IdentName::new(id.sym.clone(), id.span);
                *p = Prop::KeyValue(KeyValueProp {
                    key: PropName::Ident(key),
                    value: Box::new(Expr::Ident(ident("queryClient"))),
                });
                self.renamed += 1;
                return;
            }
        }
        p.visit_mut_children_with(self);
    }
}

// -----------------------------------------------------------------------------
// Import consolidator
// -----------------------------------------------------------------------------

/// Drops every origin-library import and merges the needed target symbols
/// into an existing `@tanstack/react-query` import, or inserts a fresh
/// declaration right after the first import (top of the module when there
/// are none).
fn consolidate_imports(module: &mut Module, caps: &Capabilities) {
    module.body.retain(|item| {
        !matches!(
            item,
            ModuleItem::ModuleDecl(ModuleDecl::Import(import))
                if import.src.value.as_ref() == SWR_MODULE
        )
    });

    let mut wanted: Vec<&'static str> = Vec::new();
    if caps.swr_hook_local.is_some() {
        wanted.push("useQuery");
    }
    if caps.config_hook_local.is_some() {
        wanted.push("useQueryClient");
    }
    if caps.provider_local.is_some() {
        wanted.push("QueryClientProvider");
    }
    if caps.has_config_export {
        wanted.push("QueryClient");
    }
    if wanted.is_empty() {
        return;
    }

    let existing = module.body.iter().position(|item| {
        matches!(
            item,
            ModuleItem::ModuleDecl(ModuleDecl::Import(import))
                if import.src.value.as_ref() == QUERY_MODULE && !import.type_only
        )
    });
    if let Some(idx) = existing {
        if let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = &mut module.body[idx] {
            let present: HashSet<String> = import
                .specifiers
                .iter()
                .filter_map(|s| match s {
                    ImportSpecifier::Named(named) => Some(named.local.sym.to_string()),
                    _ => None,
                })
                .collect();
            for name in &wanted {
                if !present.contains(*name) {
                    import.specifiers.push(named_specifier(name));
                }
            }
        }
        return;
    }

    let decl = ModuleItem::ModuleDecl(ModuleDecl::Import(ImportDecl {
        span: DUMMY_SP,
        specifiers: wanted.iter().map(|name| named_specifier(name)).collect(),
        src: Box::new(str_lit(QUERY_MODULE)),
        type_only: false,
        with: None,
        phase: ImportPhase::Evaluation,
    }));
    let pos = module
        .body
        .iter()
        .position(|item| matches!(item, ModuleItem::ModuleDecl(ModuleDecl::Import(_))))
        .map(|idx| idx + 1)
        .unwrap_or(0);
    module.body.insert(pos, decl);
}

fn named_specifier(name: &str) -> ImportSpecifier {
    ImportSpecifier::Named(ImportNamedSpecifier {
        span: DUMMY_SP,
        local: ident(name),
        imported: None,
        is_type_only: false,
    })
}

// -----------------------------------------------------------------------------
// Node-construction helpers
// -----------------------------------------------------------------------------

fn ident(sym: &str) -> Ident {
    Ident::new(sym.into(), DUMMY_SP, SyntaxContext::empty())
}

fn ident_name(sym: &str) -> IdentName {
    IdentName::new(sym.into(), DUMMY_SP)
}

/// Synthesized string literals carry single-quoted raw text so new code
/// matches the quote style of the codebase; literals carried over from the
/// input keep their original raw form.
fn str_lit(value: &str) -> Str {
    Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: Some(format!("'{}'", value).into()),
    }
}

fn key_value_prop(name: &str, value: Box<Expr>) -> PropOrSpread {
    PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
        key: PropName::Ident(ident_name(name)),
        value,
    })))
}

fn single_array(expr: Box<Expr>) -> Expr {
    Expr::Array(ArrayLit {
        span: DUMMY_SP,
        elems: vec![Some(as_arg(expr))],
    })
}

fn as_arg(expr: Box<Expr>) -> ExprOrSpread {
    ExprOrSpread { spread: None, expr }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

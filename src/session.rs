//! The command dispatcher: the single `Session` that owns the open DBF, its
//! open XDX indexes, and the memory-variable store, and executes parsed
//! `Command`s against them.
//!
//! Scope/FOR/WHILE iteration is factored into one `iterate` helper shared
//! by every scoped command instead of each handler re-deriving the loop.

use crate::config::SessionConfig;
use crate::dbf::field::{FieldDescriptor, FieldType};
use crate::dbf::Dbf;
use crate::error::{ErrorKind, XbaseError, XbaseResult};
use crate::lang::ast::{BinOp, CloseTarget, Conditions, FieldSpec, GoTarget, Scope, SetValue, UnOp, VarScope};
use crate::lang::{Command, EvalContext, Evaluator, Expr, Parser};
use crate::value::Value;
use crate::vars::VarStore;
use crate::xdx::{KeyType, Xdx};
use log::{debug, info, trace, warn};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

struct OpenIndex {
    xdx: Xdx,
    key_ast: Expr,
}

pub struct Session {
    pub dbf: Option<Dbf>,
    indexes: Vec<OpenIndex>,
    active_index: Option<usize>,
    pub vars: VarStore,
    pub config: SessionConfig,
    locate_cond: Option<Conditions>,
    pub quit_requested: bool,
    pub cancel_requested: bool,
    set_deleted: bool,
    set_exact: bool,
}

impl Session {
    pub fn new(config: SessionConfig) -> Session {
        let set_deleted = config.set_deleted;
        let set_exact = config.set_exact;
        Session {
            dbf: None,
            indexes: Vec::new(),
            active_index: None,
            vars: VarStore::new(),
            config,
            locate_cond: None,
            quit_requested: false,
            cancel_requested: false,
            set_deleted,
            set_exact,
        }
    }

    fn resolve_path(&self, name: &str, ext: &str) -> PathBuf {
        let mut p = PathBuf::from(name);
        if p.extension().is_none() {
            p.set_extension(ext);
        }
        match &self.config.working_dir {
            Some(wd) if p.is_relative() => wd.join(p),
            _ => p,
        }
    }

    /// Runs every command in `src` in sequence, logging (rather than
    /// aborting on) a command that fails, and stopping at QUIT or a parse
    /// error. This is what the line-oriented driver binary feeds whole
    /// script files or accumulated stdin through.
    pub fn run(&mut self, src: &str, out: &mut dyn Write, input: &mut dyn BufRead) -> XbaseResult<()> {
        let mut parser = Parser::new(src);
        loop {
            if self.quit_requested {
                break;
            }
            match parser.parse_command() {
                Ok(None) => break,
                Ok(Some(cmd)) => {
                    if let Err(e) = self.dispatch(cmd, out, input) {
                        warn!("command failed: {e}");
                    }
                }
                Err(e) => {
                    warn!("parse error: {e}");
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Parses and runs a single command, surfacing its error directly
    /// (rather than swallowing it into a log line as `run` does) — the
    /// shape an interactive REPL driver wants per line of input.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write, input: &mut dyn BufRead) -> XbaseResult<()> {
        let mut parser = Parser::new(line);
        match parser.parse_command()? {
            Some(cmd) => self.dispatch(cmd, out, input),
            None => Ok(()),
        }
    }

    fn require_dbf(&self) -> XbaseResult<&Dbf> {
        self.dbf.as_ref().ok_or_else(|| XbaseError::new(ErrorKind::NoDatabase, "no database in use"))
    }

    fn require_dbf_mut(&mut self) -> XbaseResult<&mut Dbf> {
        self.dbf.as_mut().ok_or_else(|| XbaseError::new(ErrorKind::NoDatabase, "no database in use"))
    }

    fn eval_current(&self, expr: &Expr) -> XbaseResult<Value> {
        let mut ctx = EvalContext::new(self.dbf.as_ref(), &self.vars);
        let v = Evaluator::eval(expr, &mut ctx)?;
        if let Some(k) = ctx.last_error {
            debug!("evaluator recorded {k:?} while evaluating an expression");
        }
        Ok(v)
    }

    pub fn dispatch(&mut self, cmd: Command, out: &mut dyn Write, input: &mut dyn BufRead) -> XbaseResult<()> {
        trace!("dispatching {cmd:?}");
        match cmd {
            Command::Use { path, alias, exclusive } => self.cmd_use(&path, alias, exclusive),
            Command::Close { target } => self.cmd_close(target),
            Command::Create { table, fields } => self.cmd_create(&table, fields),
            Command::List { fields, cond } => self.cmd_list_display(&fields, &cond, true, out),
            Command::Display { fields, cond } => self.cmd_list_display(&fields, &cond, false, out),
            Command::Go { target } => self.cmd_go(target),
            Command::Skip { amount } => self.cmd_skip(amount),
            Command::Locate { cond } => self.cmd_locate(cond),
            Command::Continue => self.cmd_continue(),
            Command::AppendBlank => self.require_dbf_mut()?.append_blank(),
            Command::Delete { cond } => self.cmd_delete_recall(&cond, true),
            Command::Recall { cond } => self.cmd_delete_recall(&cond, false),
            Command::Pack => self.require_dbf_mut()?.pack().map(|_| ()),
            Command::Zap => self.require_dbf_mut()?.zap(),
            Command::Index { expr, to, unique, descending } => self.cmd_index(expr, &to, unique, descending),
            Command::SetIndex { paths } => self.cmd_set_index(&paths),
            Command::Seek { expr } => self.cmd_seek(expr),
            Command::Reindex => self.cmd_reindex(),
            Command::SetOrder { n } => self.cmd_set_order(n),
            Command::Replace { assignments, cond } => self.cmd_replace(&assignments, &cond),
            Command::Store { expr, targets } => self.cmd_store(&expr, &targets),
            Command::Assign { target, expr } => {
                let v = self.eval_current(&expr)?;
                self.vars.set(&target, v);
                Ok(())
            }
            Command::Set { option, value } => self.cmd_set(&option, value),
            Command::Clear => Ok(()),
            Command::VarDecl { scope, names } => {
                for name in &names {
                    self.vars.declare(scope.clone(), name);
                }
                Ok(())
            }
            Command::Release { names } => {
                if names.is_empty() {
                    self.vars.release_all();
                } else {
                    for name in &names {
                        self.vars.release(name);
                    }
                }
                Ok(())
            }
            Command::Count { cond, into } => self.cmd_count(&cond, into, out),
            Command::Sum { exprs, cond, into } => self.cmd_sum_avg(&exprs, &cond, &into, out, true),
            Command::Average { exprs, cond, into } => self.cmd_sum_avg(&exprs, &cond, &into, out, false),
            Command::Wait { message } => self.cmd_wait(message, out, input),
            Command::Quit => {
                self.quit_requested = true;
                Ok(())
            }
            Command::Say { exprs, newline } => self.cmd_say(&exprs, newline, out),
            Command::Help => {
                writeln!(out, "commands: USE CLOSE CREATE LIST DISPLAY GO SKIP LOCATE CONTINUE")?;
                writeln!(out, "APPEND BLANK, DELETE, RECALL, PACK, ZAP, INDEX ON, SET INDEX TO,")?;
                writeln!(out, "SEEK, REINDEX, SET ORDER TO, REPLACE, STORE, SET, public/private/")?;
                writeln!(out, "local, RELEASE, COUNT, SUM, AVERAGE, WAIT, QUIT, ?/??")?;
                Ok(())
            }
        }
    }

    // === work area ===

    fn cmd_use(&mut self, path: &str, alias: Option<String>, exclusive: bool) -> XbaseResult<()> {
        self.cmd_close(CloseTarget::Databases)?;
        let full = self.resolve_path(path, "dbf");
        let mut dbf = Dbf::open(&full, false)?;
        if let Some(a) = alias {
            dbf.alias = a.to_ascii_uppercase();
        }
        dbf.exclusive = exclusive;
        info!("USE {}", full.display());
        self.dbf = Some(dbf);
        Ok(())
    }

    fn cmd_close(&mut self, target: CloseTarget) -> XbaseResult<()> {
        for idx in self.indexes.iter_mut() {
            idx.xdx.close()?;
        }
        self.indexes.clear();
        self.active_index = None;
        if target == CloseTarget::Indexes {
            return Ok(());
        }
        self.locate_cond = None;
        if let Some(dbf) = self.dbf.as_mut() {
            dbf.close()?;
        }
        self.dbf = None;
        Ok(())
    }

    fn cmd_create(&mut self, table: &str, fields: Vec<FieldSpec>) -> XbaseResult<()> {
        self.cmd_close(CloseTarget::Databases)?;
        let full = self.resolve_path(table, "dbf");
        let mut descs = Vec::with_capacity(fields.len());
        for f in fields {
            let field_type = FieldType::from_code(f.field_type as u8)?;
            descs.push(FieldDescriptor {
                name: f.name.to_ascii_uppercase(),
                field_type,
                length: f.length as usize,
                decimal_count: f.decimals,
                offset: 0,
            });
        }
        let dbf = Dbf::create(&full, descs)?;
        info!("CREATE {}", full.display());
        self.dbf = Some(dbf);
        Ok(())
    }

    // === navigation ===

    fn cmd_go(&mut self, target: GoTarget) -> XbaseResult<()> {
        match target {
            GoTarget::Top => self.require_dbf_mut()?.go_top(),
            GoTarget::Bottom => self.require_dbf_mut()?.go_bottom(),
            GoTarget::Record(e) => {
                let n = self.eval_current(&e)?.to_number() as u32;
                self.require_dbf_mut()?.goto(n)
            }
        }
    }

    fn cmd_skip(&mut self, amount: Option<Expr>) -> XbaseResult<()> {
        let n = match amount {
            Some(e) => self.eval_current(&e)?.to_number() as i64,
            None => 1,
        };
        self.require_dbf_mut()?.skip(n)
    }

    fn cmd_locate(&mut self, cond: Conditions) -> XbaseResult<()> {
        self.require_dbf_mut()?.go_top()?;
        self.locate_cond = Some(cond.clone());
        self.scan_for_match(&cond)
    }

    fn cmd_continue(&mut self) -> XbaseResult<()> {
        let cond = self
            .locate_cond
            .clone()
            .ok_or_else(|| XbaseError::new(ErrorKind::Syntax, "CONTINUE without a prior LOCATE"))?;
        self.require_dbf_mut()?.skip(1)?;
        self.scan_for_match(&cond)
    }

    /// Scans forward from the current record until `for_cond`/`while_cond`
    /// (remembered at the session level across LOCATE/CONTINUE) matches or
    /// EOF is reached.
    fn scan_for_match(&mut self, cond: &Conditions) -> XbaseResult<()> {
        loop {
            if self.require_dbf()?.eof() {
                return Ok(());
            }
            if self.set_deleted && self.require_dbf()?.deleted() {
                self.require_dbf_mut()?.skip(1)?;
                continue;
            }
            if let Some(w) = &cond.while_cond {
                if !self.eval_current(w)?.to_logical() {
                    return Ok(());
                }
            }
            let matched = match &cond.for_cond {
                Some(f) => self.eval_current(f)?.to_logical(),
                None => true,
            };
            if matched {
                return Ok(());
            }
            self.require_dbf_mut()?.skip(1)?;
        }
    }

    fn cmd_delete_recall(&mut self, cond: &Conditions, delete: bool) -> XbaseResult<()> {
        self.iterate(cond, false, |session, _recno| {
            let dbf = session.require_dbf_mut()?;
            if delete {
                dbf.delete()
            } else {
                dbf.recall()
            }
        })?;
        Ok(())
    }

    // === the shared scope/FOR/WHILE iteration helper ===

    /// Visits every record selected by `cond`'s scope/FOR/WHILE clauses,
    /// running `visit` on each one that passes. Returns the number of
    /// records `visit` actually ran on.
    fn iterate<F>(&mut self, cond: &Conditions, default_all: bool, mut visit: F) -> XbaseResult<usize>
    where
        F: FnMut(&mut Session, u32) -> XbaseResult<()>,
    {
        self.require_dbf()?;
        let scope = cond.scope.clone().unwrap_or(Scope::Default);
        let effective = match &scope {
            Scope::Default if default_all || cond.for_cond.is_some() || cond.while_cond.is_some() => Scope::All,
            other => other.clone(),
        };

        let mut processed = 0usize;

        match effective {
            Scope::Record(ref e) => {
                let n = self.eval_current(e)?.to_number() as u32;
                self.require_dbf_mut()?.goto(n)?;
                let passes = match &cond.for_cond {
                    Some(f) => self.eval_current(f)?.to_logical(),
                    None => true,
                };
                if passes && n != 0 && n <= self.require_dbf()?.reccount() {
                    visit(self, n)?;
                    processed += 1;
                }
                return Ok(processed);
            }
            Scope::Default => {
                let n = self.require_dbf()?.recno();
                let passes = match &cond.for_cond {
                    Some(f) => self.eval_current(f)?.to_logical(),
                    None => true,
                };
                if n != 0 && passes {
                    visit(self, n)?;
                    processed += 1;
                }
                return Ok(processed);
            }
            Scope::All => {
                self.require_dbf_mut()?.go_top()?;
            }
            Scope::Rest => {}
            Scope::Next(_) => {}
        }

        let limit = if let Scope::Next(ref e) = effective {
            Some(self.eval_current(e)?.to_number().max(0.0) as usize)
        } else {
            None
        };

        let mut considered = 0usize;
        loop {
            if self.quit_requested || self.cancel_requested {
                break;
            }
            if self.require_dbf()?.eof() {
                break;
            }
            if let Some(limit) = limit {
                if considered >= limit {
                    break;
                }
            }
            if let Some(w) = &cond.while_cond {
                if !self.eval_current(w)?.to_logical() {
                    break;
                }
            }
            considered += 1;
            if self.set_deleted && self.require_dbf()?.deleted() {
                self.require_dbf_mut()?.skip(1)?;
                continue;
            }
            let recno = self.require_dbf()?.recno();
            let passes = match &cond.for_cond {
                Some(f) => self.eval_current(f)?.to_logical(),
                None => true,
            };
            if passes {
                visit(self, recno)?;
                processed += 1;
            }
            self.require_dbf_mut()?.skip(1)?;
        }
        Ok(processed)
    }

    // === printing ===

    fn format_row(&self, fields: &[Expr]) -> XbaseResult<String> {
        let dbf = self.require_dbf()?;
        let marker = if dbf.deleted() { '*' } else { ' ' };
        let mut line = format!("{:>7} {}", dbf.recno(), marker);
        if fields.is_empty() {
            for i in 0..dbf.field_count() {
                line.push(' ');
                line.push_str(&dbf.get(i)?.to_display_string());
            }
        } else {
            for e in fields {
                line.push(' ');
                line.push_str(&self.eval_current(e)?.to_display_string());
            }
        }
        Ok(line)
    }

    fn cmd_list_display(
        &mut self,
        fields: &[Expr],
        cond: &Conditions,
        default_all: bool,
        out: &mut dyn Write,
    ) -> XbaseResult<()> {
        self.iterate(cond, default_all, |session, _recno| {
            let line = session.format_row(fields)?;
            writeln!(out, "{line}")?;
            Ok(())
        })
        .map(|_| ())
    }

    fn cmd_say(&mut self, exprs: &[Expr], newline: bool, out: &mut dyn Write) -> XbaseResult<()> {
        let parts: Result<Vec<String>, _> =
            exprs.iter().map(|e| self.eval_current(e).map(|v| v.to_display_string())).collect();
        let parts = parts?;
        write!(out, "{}", parts.join(" "))?;
        if newline {
            writeln!(out)?;
        }
        Ok(())
    }

    fn cmd_wait(&mut self, message: Option<String>, out: &mut dyn Write, input: &mut dyn BufRead) -> XbaseResult<()> {
        write!(out, "{}", message.unwrap_or_else(|| "Press ENTER to continue...".to_string()))?;
        out.flush()?;
        let mut line = String::new();
        input.read_line(&mut line)?;
        Ok(())
    }

    // === aggregates ===

    fn cmd_count(&mut self, cond: &Conditions, into: Option<String>, out: &mut dyn Write) -> XbaseResult<()> {
        let n = self.iterate(cond, true, |_, _| Ok(()))?;
        match into {
            Some(name) => self.vars.set(&name, Value::Number(n as f64)),
            None => writeln!(out, "{n} records")?,
        }
        Ok(())
    }

    fn cmd_sum_avg(
        &mut self,
        exprs: &[Expr],
        cond: &Conditions,
        into: &[String],
        out: &mut dyn Write,
        is_sum: bool,
    ) -> XbaseResult<()> {
        let mut totals = vec![0.0f64; exprs.len()];
        let n = self.iterate(cond, true, |session, _recno| {
            for (i, e) in exprs.iter().enumerate() {
                totals[i] += session.eval_current(e)?.to_number();
            }
            Ok(())
        })?;
        let results: Vec<f64> = if is_sum || n == 0 {
            totals
        } else {
            totals.iter().map(|t| t / n as f64).collect()
        };
        if into.is_empty() {
            let rendered: Vec<String> = results.iter().map(|r| r.to_string()).collect();
            writeln!(out, "{}", rendered.join("  "))?;
        } else {
            for (name, value) in into.iter().zip(results.iter()) {
                self.vars.set(name, Value::Number(*value));
            }
        }
        Ok(())
    }

    // === variables ===

    fn cmd_store(&mut self, expr: &Expr, targets: &[String]) -> XbaseResult<()> {
        let v = self.eval_current(expr)?;
        for t in targets {
            self.vars.set(t, v.clone());
        }
        Ok(())
    }

    fn cmd_replace(&mut self, assignments: &[(String, Expr)], cond: &Conditions) -> XbaseResult<()> {
        self.iterate(cond, false, |session, _recno| {
            for (field, expr) in assignments {
                let v = session.eval_current(expr)?;
                let dbf = session.require_dbf_mut()?;
                let idx = dbf
                    .field_index(field)
                    .ok_or_else(|| XbaseError::new(ErrorKind::InvalidField, format!("unknown field {field}")))?;
                dbf.put(idx, &v)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn cmd_set(&mut self, option: &str, value: SetValue) -> XbaseResult<()> {
        match option.to_ascii_uppercase().as_str() {
            "DELETED" => {
                self.set_deleted = matches!(value, SetValue::On);
                Ok(())
            }
            "EXACT" => {
                self.set_exact = matches!(value, SetValue::On);
                Ok(())
            }
            "ORDER" => match value {
                SetValue::Expr(e) => self.cmd_set_order(e),
                _ => Err(XbaseError::new(ErrorKind::Syntax, "SET ORDER requires TO <n>")),
            },
            // A bare path like `SET INDEX TO byname` parses as an Ident
            // expression, not a string — resolving it through the evaluator
            // would hit the unknown-identifier-reads-as-empty-string
            // fallback, so the literal name/string text is taken directly
            // instead of evaluating the expression.
            "INDEX" => match value {
                SetValue::Expr(Expr::Ident(name)) => self.cmd_set_index(&[name]),
                SetValue::Expr(Expr::String(name)) => self.cmd_set_index(&[name]),
                SetValue::Expr(e) => {
                    let path = self.eval_current(&e)?.to_display_string();
                    self.cmd_set_index(&[path])
                }
                _ => Err(XbaseError::new(ErrorKind::Syntax, "SET INDEX requires TO <path>")),
            },
            other => Err(XbaseError::new(ErrorKind::NotImplemented, format!("SET {other} is not implemented"))),
        }
    }

    // === indexes ===

    fn cmd_index(&mut self, expr: Expr, to: &str, unique: bool, descending: bool) -> XbaseResult<()> {
        let full = self.resolve_path(to, "xdx");
        let (key_type, key_length) = self.detect_key_type(&expr)?;
        let mut xdx = Xdx::create(&full, &render_expr(&expr), key_type, key_length, unique, descending)?;
        {
            let dbf = self.dbf.as_mut().ok_or_else(|| XbaseError::new(ErrorKind::NoDatabase, "no database in use"))?;
            reindex_one(dbf, &self.vars, &mut xdx, &expr, key_type, key_length)?;
        }
        info!("INDEX ON {} TO {}", render_expr(&expr), full.display());
        self.indexes.push(OpenIndex { xdx, key_ast: expr });
        self.active_index = Some(self.indexes.len() - 1);
        Ok(())
    }

    fn cmd_set_index(&mut self, paths: &[String]) -> XbaseResult<()> {
        for p in self.indexes.iter_mut() {
            p.xdx.close()?;
        }
        self.indexes.clear();
        self.active_index = None;
        for p in paths {
            let full = self.resolve_path(p, "xdx");
            let xdx = Xdx::open(&full)?;
            let mut parser = Parser::new(xdx.key_expr());
            let key_ast = parser.parse_expression().map_err(|_| {
                XbaseError::new(ErrorKind::NotImplemented, "stored key expression could not be re-parsed")
            })?;
            self.indexes.push(OpenIndex { xdx, key_ast });
        }
        if !self.indexes.is_empty() {
            self.active_index = Some(0);
        }
        Ok(())
    }

    fn cmd_seek(&mut self, expr: Expr) -> XbaseResult<()> {
        let idx = self
            .active_index
            .ok_or_else(|| XbaseError::new(ErrorKind::InvalidIndex, "no controlling index (SET ORDER TO first)"))?;
        let v = self.eval_current(&expr)?;
        let (key_type, key_length) = (self.indexes[idx].xdx.key_type, self.indexes[idx].xdx.key_length);
        let key = encode_key(&v, key_type, key_length);
        let found = self.indexes[idx].xdx.seek(&key)?;
        let recno = self.indexes[idx].xdx.recno();
        let dbf = self.require_dbf_mut()?;
        if found {
            dbf.goto(recno)?;
        } else {
            dbf.goto(dbf.reccount() + 1)?;
        }
        Ok(())
    }

    fn cmd_reindex(&mut self) -> XbaseResult<()> {
        for i in 0..self.indexes.len() {
            let key_ast = self.indexes[i].key_ast.clone();
            let (key_type, key_length) = (self.indexes[i].xdx.key_type, self.indexes[i].xdx.key_length);
            let dbf = self.dbf.as_mut().ok_or_else(|| XbaseError::new(ErrorKind::NoDatabase, "no database in use"))?;
            reindex_one(dbf, &self.vars, &mut self.indexes[i].xdx, &key_ast, key_type, key_length)?;
        }
        Ok(())
    }

    fn cmd_set_order(&mut self, n: Expr) -> XbaseResult<()> {
        let n = self.eval_current(&n)?.to_number() as i64;
        if n <= 0 {
            self.active_index = None;
            return Ok(());
        }
        let idx = (n - 1) as usize;
        if idx >= self.indexes.len() {
            return Err(XbaseError::new(ErrorKind::InvalidIndex, format!("no index number {n} is open")));
        }
        self.active_index = Some(idx);
        Ok(())
    }

    /// Auto-detects an XDX key type/length from the key expression's value
    /// on the first non-deleted record, using the NUMERIC/DATE/CHAR rule
    /// documented in DESIGN.md.
    fn detect_key_type(&mut self, expr: &Expr) -> XbaseResult<(KeyType, u16)> {
        let reccount = self.require_dbf()?.reccount();
        let saved_recno = self.require_dbf()?.recno();
        let mut found = None;
        for recno in 1..=reccount {
            self.require_dbf_mut()?.goto(recno)?;
            if self.require_dbf()?.deleted() {
                continue;
            }
            found = Some(self.eval_current(expr)?);
            break;
        }
        self.require_dbf_mut()?.goto(saved_recno)?;
        Ok(match found {
            Some(Value::Number(_)) => (KeyType::Numeric, 20),
            Some(Value::Date(_)) => (KeyType::Date, 8),
            Some(Value::String(s)) => (KeyType::Char, (s.len().clamp(1, 240)) as u16),
            _ => (KeyType::Char, 20),
        })
    }
}

/// Re-runs an index build against every non-deleted record, evaluating
/// `key_ast` per record to derive the key bytes. Free function (not a
/// `Session` method) so it can borrow `dbf`/`vars`/`xdx` as three disjoint
/// fields at once without fighting the borrow checker over `&mut self`.
fn reindex_one(
    dbf: &mut Dbf,
    vars: &VarStore,
    xdx: &mut Xdx,
    key_ast: &Expr,
    key_type: KeyType,
    key_length: u16,
) -> XbaseResult<()> {
    xdx.reindex(dbf, |dbf, _recno| {
        let mut ctx = EvalContext::new(Some(&*dbf), vars);
        let v = Evaluator::eval(key_ast, &mut ctx)?;
        Ok(Some(encode_key(&v, key_type, key_length)))
    })
}

/// Encodes a `Value` into the fixed-width byte key an XDX node stores,
/// matching `comparator::compare`'s CHAR-memcmp/NUMERIC-parse/DATE-memcmp
/// expectations.
fn encode_key(value: &Value, key_type: KeyType, key_length: u16) -> Vec<u8> {
    let len = key_length as usize;
    match key_type {
        KeyType::Char => {
            let s = value.to_display_string();
            let mut bytes = s.into_bytes();
            bytes.resize(len, b' ');
            bytes.truncate(len);
            bytes
        }
        KeyType::Numeric => {
            let mut text = format!("{:.4}", value.to_number());
            if text.len() > len {
                text = text[text.len() - len..].to_string();
            }
            let mut bytes = vec![b' '; len];
            let start = len - text.len();
            bytes[start..].copy_from_slice(text.as_bytes());
            bytes
        }
        KeyType::Date => {
            let s = match value {
                Value::Date(s) => s.clone(),
                _ => Value::empty_date().to_display_string(),
            };
            let mut bytes = s.into_bytes();
            bytes.resize(len, b' ');
            bytes.truncate(len);
            bytes
        }
    }
}

/// Pretty-prints an `Expr` back to dBASE source text, used both to persist
/// an index's key expression in its XDX header and to re-parse it back into
/// an AST after `SET INDEX TO` reopens a file from a previous session
/// (which only has the text, not the `Expr` this session built it from).
fn render_expr(e: &Expr) -> String {
    match e {
        Expr::Number(n) => n.to_string(),
        Expr::String(s) => format!("\"{s}\""),
        Expr::DateLiteral(s) => format!("{{{s}}}"),
        Expr::Logical(b) => if *b { ".T.".to_string() } else { ".F.".to_string() },
        Expr::Ident(s) => s.clone(),
        Expr::AliasField(a, f) => format!("{a}->{f}"),
        Expr::Macro(s) => format!("&{s}"),
        Expr::Call(name, args) => {
            format!("{name}({})", args.iter().map(render_expr).collect::<Vec<_>>().join(","))
        }
        Expr::Index(base, idx) => format!("{}[{}]", render_expr(base), render_expr(idx)),
        Expr::Unary(op, inner) => match op {
            UnOp::Neg => format!("-{}", render_expr(inner)),
            UnOp::Plus => format!("+{}", render_expr(inner)),
            UnOp::Not => format!(".NOT. {}", render_expr(inner)),
        },
        Expr::Binary(op, l, r) => {
            let sym = match op {
                BinOp::Add => "+",
                BinOp::Sub => "-",
                BinOp::Mul => "*",
                BinOp::Div => "/",
                BinOp::Mod => "%",
                BinOp::Pow => "^",
                BinOp::Eq => "=",
                BinOp::Ne => "<>",
                BinOp::Lt => "<",
                BinOp::Le => "<=",
                BinOp::Gt => ">",
                BinOp::Ge => ">=",
                BinOp::And => ".AND.",
                BinOp::Or => ".OR.",
                BinOp::In => "$",
            };
            format!("({} {sym} {})", render_expr(l), render_expr(r))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    fn new_session(dir: &Path) -> Session {
        let mut cfg = SessionConfig::default();
        cfg.working_dir = Some(dir.to_path_buf());
        Session::new(cfg)
    }

    fn run(session: &mut Session, src: &str) -> String {
        let mut out = Vec::new();
        let mut input = BufReader::new(Cursor::new(Vec::<u8>::new()));
        session.run(src, &mut out, &mut input).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn create_append_replace_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = new_session(dir.path());
        run(&mut s, "CREATE people\nNAME,C,20\nAGE,N,3\n;\n");
        run(&mut s, "USE people\n");
        run(&mut s, "APPEND BLANK\nREPLACE NAME WITH \"Alice\", AGE WITH 30\n");
        run(&mut s, "APPEND BLANK\nREPLACE NAME WITH \"Bob\", AGE WITH 25\n");
        let out = run(&mut s, "LIST\n");
        assert!(out.contains("Alice"));
        assert!(out.contains("Bob"));
    }

    #[test]
    fn navigation_and_skip() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = new_session(dir.path());
        run(&mut s, "CREATE t\nN,N,3\n;\n");
        run(&mut s, "USE t\n");
        for i in 1..=3 {
            run(&mut s, "APPEND BLANK\n");
            run(&mut s, &format!("REPLACE N WITH {i}\n"));
        }
        run(&mut s, "GO TOP\n");
        assert_eq!(s.dbf.as_ref().unwrap().recno(), 1);
        run(&mut s, "SKIP 2\n");
        assert_eq!(s.dbf.as_ref().unwrap().recno(), 3);
    }

    #[test]
    fn delete_pack_zap() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = new_session(dir.path());
        run(&mut s, "CREATE t\nN,N,3\n;\n");
        run(&mut s, "USE t\n");
        for i in 1..=3 {
            run(&mut s, "APPEND BLANK\n");
            run(&mut s, &format!("REPLACE N WITH {i}\n"));
        }
        run(&mut s, "GO 2\nDELETE\nPACK\n");
        assert_eq!(s.dbf.as_ref().unwrap().reccount(), 2);
        run(&mut s, "ZAP\n");
        assert_eq!(s.dbf.as_ref().unwrap().reccount(), 0);
    }

    #[test]
    fn expression_evaluation_and_variables() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = new_session(dir.path());
        let out = run(&mut s, "X = 2 + 3 * 4\n? X\n");
        assert!(out.contains("14"));
    }

    #[test]
    fn index_build_and_seek() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = new_session(dir.path());
        run(&mut s, "CREATE t\nNAME,C,10\n;\n");
        run(&mut s, "USE t\n");
        for name in ["Charlie", "Alice", "Bob"] {
            run(&mut s, "APPEND BLANK\n");
            run(&mut s, &format!("REPLACE NAME WITH \"{name}\"\n"));
        }
        run(&mut s, "INDEX ON NAME TO byname\n");
        run(&mut s, "SEEK \"Bob\"\n");
        assert_eq!(s.dbf.as_ref().unwrap().get(0).unwrap().to_display_string().trim(), "Bob");
    }

    #[test]
    fn unique_index_rejects_duplicate_during_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = new_session(dir.path());
        run(&mut s, "CREATE t\nNAME,C,10\n;\n");
        run(&mut s, "USE t\n");
        for name in ["Alice", "Alice"] {
            run(&mut s, "APPEND BLANK\n");
            run(&mut s, &format!("REPLACE NAME WITH \"{name}\"\n"));
        }
        // reindex swallows DuplicateKey; the command itself still succeeds
        run(&mut s, "INDEX ON NAME TO byname UNIQUE\n");
    }
}

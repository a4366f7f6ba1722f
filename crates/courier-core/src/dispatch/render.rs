//! Textual rendering of a dispatch table as the routine it stands for.

use std::fmt;

use crate::container::InstanceScope;
use crate::protocol::METHOD_REPLY_TOPIC;

use super::{DispatchRule, DispatchTable};

/// Display adapter produced by [`DispatchTable::render`].
///
/// The output is a readable listing of the handler the table drives, one
/// guarded block per rule, with each argument shown as its cast expression:
///
/// ```text
/// handler OfflineServiceImpl (shared) {
///     let command = envelope.command_label;
///     let params = envelope.parameters;
///     if command == "OnlineService|greet(String)" {
///         let arg0 = (String) params[0];
///         let instance = context.create_instance("OfflineServiceImpl");
///         let ret = instance.greet(arg0);
///         reply("MethodReply", envelope.reply_to, ret);
///         return;
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RenderedDispatch<'a> {
    table: &'a DispatchTable,
}

impl<'a> RenderedDispatch<'a> {
    pub(super) const fn new(table: &'a DispatchTable) -> Self {
        Self { table }
    }

    fn rule(&self, f: &mut fmt::Formatter<'_>, rule: &DispatchRule) -> fmt::Result {
        writeln!(f, "    if command == \"{}\" {{", rule.signature())?;

        let mut arguments = Vec::with_capacity(rule.parameters().len());
        for (position, cast) in rule.parameters().iter().enumerate() {
            writeln!(f, "        let arg{position} = {cast};")?;
            arguments.push(format!("arg{position}"));
        }

        writeln!(
            f,
            "        let instance = context.create_instance(\"{}\");",
            self.table.service()
        )?;
        let call = format!("instance.{}({})", rule.method().name(), arguments.join(", "));
        if rule.returns_value() {
            writeln!(f, "        let ret = {call};")?;
        } else {
            writeln!(f, "        {call};")?;
        }
        if rule.tears_down() {
            writeln!(f, "        context.destroy_instance(instance);")?;
        }
        if rule.returns_value() {
            writeln!(
                f,
                "        reply(\"{METHOD_REPLY_TOPIC}\", envelope.reply_to, ret);"
            )?;
        }
        writeln!(f, "        return;")?;
        writeln!(f, "    }}")
    }
}

impl fmt::Display for RenderedDispatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = match self.table.scope() {
            InstanceScope::Shared => "shared",
            InstanceScope::Dependent => "dependent",
        };
        writeln!(f, "handler {} ({scope}) {{", self.table.service())?;
        writeln!(f, "    let command = envelope.command_label;")?;
        writeln!(f, "    let params = envelope.parameters;")?;
        for rule in self.table.rules() {
            self.rule(f, rule)?;
        }
        writeln!(f, "}}")
    }
}

//! Derived attribute and resource-pool recompute.
//!
//! The recompute is a pure function of the sheet, the definition tables, the
//! compiled formula set and the character configuration. Quest re-checks and
//! the recursion guard live on the aggregate, which calls in here.

use super::defs::DefinitionTables;
use super::formula::{FormulaSet, FormulaVars};
use super::sheet::CharacterSheet;
use super::types::{Attributes, DerivedStats};
use crate::config::CharacterConfig;

pub const MAX_WEIGHT_CAP: i32 = 250;
pub const MIN_MAX_WEIGHT: i32 = 70;

/// Everything outside the sheet a recompute reads.
pub struct StatInputs<'a> {
    pub tables: &'a DefinitionTables,
    pub formulas: &'a FormulaSet,
    pub config: &'a CharacterConfig,
    pub bot: bool,
    /// Total minutes played including the current session.
    pub usage: i32,
}

/// Side effects the caller has to forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatOutcome {
    /// Set when hp or tp were clamped down to the new maxima.
    pub recovered: Option<(i32, i32)>,
}

fn formula_value(formulas: &FormulaSet, key: &str, vars: &FormulaVars) -> i32 {
    let value = formulas.eval_or_zero(key, vars).floor();
    value.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// Recompute adjusted/display attributes and every derived field in place.
pub fn recompute(sheet: &mut CharacterSheet, inputs: &StatInputs<'_>) -> StatOutcome {
    let class = inputs.tables.class(sheet.class);
    let mut adjusted = sheet.base + class.bonus;
    let mut derived = DerivedStats::default();

    let mut weight: i64 = 0;
    for entry in &sheet.inventory {
        let item = inputs.tables.item(entry.id);
        weight += i64::from(item.weight) * i64::from(entry.amount);
        if weight >= i64::from(MAX_WEIGHT_CAP) {
            break;
        }
    }

    for (_, item_id) in sheet.paperdoll.equipped() {
        let item = inputs.tables.item(item_id);
        weight += i64::from(item.weight);
        derived.max_hp = derived.max_hp.saturating_add(item.hp);
        derived.max_tp = derived.max_tp.saturating_add(item.tp);
        derived.min_damage = derived.min_damage.saturating_add(item.min_damage);
        derived.max_damage = derived.max_damage.saturating_add(item.max_damage);
        derived.accuracy = derived.accuracy.saturating_add(item.accuracy);
        derived.evade = derived.evade.saturating_add(item.evade);
        derived.armor = derived.armor.saturating_add(item.armor);
        adjusted += item.bonus;
    }

    derived.weight = weight.clamp(0, i64::from(MAX_WEIGHT_CAP)) as i32;

    sheet.adjusted = adjusted;
    sheet.display = if inputs.config.use_adjusted_stats {
        adjusted
    } else {
        sheet.base
    };
    sheet.derived = derived;

    let vars = formula_vars(sheet, inputs.bot, inputs.usage);
    let formulas = inputs.formulas;

    derived.max_hp = derived.max_hp.saturating_add(formula_value(formulas, "hp", &vars));
    derived.max_tp = derived.max_tp.saturating_add(formula_value(formulas, "tp", &vars));
    derived.max_sp = derived.max_sp.saturating_add(formula_value(formulas, "sp", &vars));
    derived.max_weight = formula_value(formulas, "weight", &vars).clamp(MIN_MAX_WEIGHT, MAX_WEIGHT_CAP);

    let mut outcome = StatOutcome::default();
    if sheet.hp > derived.max_hp || sheet.tp > derived.max_tp {
        sheet.hp = sheet.hp.min(derived.max_hp);
        sheet.tp = sheet.tp.min(derived.max_tp);
        outcome.recovered = Some((sheet.hp, sheet.tp));
    }

    if inputs.config.use_class_formulas {
        let prefix = format!("class.{}", class.archetype);
        let damage = formula_value(formulas, &format!("{prefix}.damage"), &vars);
        derived.min_damage = derived.min_damage.saturating_add(damage);
        derived.max_damage = derived.max_damage.saturating_add(damage);
        derived.armor = derived.armor.saturating_add(formula_value(formulas, &format!("{prefix}.defence"), &vars));
        derived.accuracy = derived.accuracy.saturating_add(formula_value(formulas, &format!("{prefix}.accuracy"), &vars));
        derived.evade = derived.evade.saturating_add(formula_value(formulas, &format!("{prefix}.evade"), &vars));
    } else {
        derived.min_damage = derived.min_damage.saturating_add(adjusted.str / 2);
        derived.max_damage = derived.max_damage.saturating_add(adjusted.str / 2);
        derived.accuracy = derived.accuracy.saturating_add(adjusted.agi / 2);
        derived.evade = derived.evade.saturating_add(adjusted.agi / 2);
        derived.armor = derived.armor.saturating_add(adjusted.con / 2);
    }

    let always = !inputs.config.base_damage_at_zero;
    if always || derived.min_damage == 0 {
        derived.min_damage = derived.min_damage.saturating_add(inputs.config.base_min_damage);
    }
    if always || derived.max_damage == 0 {
        derived.max_damage = derived.max_damage.saturating_add(inputs.config.base_max_damage);
    }

    sheet.derived = derived;
    outcome
}

fn insert_attributes(vars: &mut FormulaVars, prefix: &str, attrs: &Attributes) {
    let pairs = [
        ("str", attrs.str),
        ("int", attrs.intl),
        ("wis", attrs.wis),
        ("agi", attrs.agi),
        ("con", attrs.con),
        ("cha", attrs.cha),
    ];
    for (name, value) in pairs {
        vars.insert(format!("{prefix}{name}"), f64::from(value));
    }
}

/// Full named-variable snapshot of a character as formulas and quest rules
/// see it. Unprefixed attribute names are the adjusted values.
pub fn formula_vars(sheet: &CharacterSheet, bot: bool, usage: i32) -> FormulaVars {
    let mut vars = FormulaVars::new();
    let d = &sheet.derived;
    let scalars = [
        ("level", f64::from(sheet.level)),
        ("exp", f64::from(sheet.exp)),
        ("hp", f64::from(sheet.hp)),
        ("maxhp", f64::from(d.max_hp)),
        ("tp", f64::from(sheet.tp)),
        ("maxtp", f64::from(d.max_tp)),
        ("maxsp", f64::from(d.max_sp)),
        ("weight", f64::from(d.weight)),
        ("maxweight", f64::from(d.max_weight)),
        ("karma", f64::from(sheet.karma)),
        ("mindam", f64::from(d.min_damage)),
        ("maxdam", f64::from(d.max_damage)),
        ("accuracy", f64::from(d.accuracy)),
        ("evade", f64::from(d.evade)),
        ("armor", f64::from(d.armor)),
        ("admin", sheet.admin.as_i64() as f64),
        ("bot", if bot { 1.0 } else { 0.0 }),
        ("usage", f64::from(usage)),
        ("class", f64::from(sheet.class)),
        ("gender", sheet.gender.as_i64() as f64),
        ("race", f64::from(sheet.race)),
        ("hairstyle", f64::from(sheet.hairstyle)),
        ("haircolor", f64::from(sheet.haircolor)),
        ("mapid", f64::from(sheet.map_id)),
        ("x", f64::from(sheet.x)),
        ("y", f64::from(sheet.y)),
        ("direction", sheet.direction.as_i64() as f64),
        ("sitting", sheet.sitting.as_i64() as f64),
        ("hidden", if sheet.hidden { 1.0 } else { 0.0 }),
        ("whispers", if sheet.whispers { 1.0 } else { 0.0 }),
        ("goldbank", f64::from(sheet.goldbank)),
        ("bankmax", f64::from(sheet.bankmax)),
        ("statpoints", f64::from(sheet.statpoints)),
        ("skillpoints", f64::from(sheet.skillpoints)),
        ("guildrank", f64::from(sheet.guild_rank)),
        ("spells", sheet.spells.len() as f64),
        ("items", sheet.inventory.len() as f64),
    ];
    for (name, value) in scalars {
        vars.insert(name.to_string(), value);
    }
    insert_attributes(&mut vars, "", &sheet.adjusted);
    insert_attributes(&mut vars, "base_", &sheet.base);
    insert_attributes(&mut vars, "display_", &sheet.display);
    vars
}

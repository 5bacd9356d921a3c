//! System prompt composition from the analysis context.
//!
//! Output is deterministic: the same snapshot always yields the same prompt. Context lines
//! appear in a fixed order (location, business type, score, satellite block) and absent
//! fields are left out.

use crate::context::ContextSnapshot;

const PREAMBLE: &str = "You are BizLocate AI, an EXPERT location analysis assistant. Give DIRECT, DATA-DRIVEN answers with ZERO uncertainty.

🎯 ANALYSIS RULES:
**AIR QUALITY:** Change >5% = HIGH construction = POOR air quality. Change <2% = stable = GOOD air quality.
**PROFITABILITY:** High urban expansion + low competition = HIGH profit potential.
**HEALTH:** Vegetation increase = BETTER air. Vegetation decrease = WORSE air.

📋 FORMAT: Use emojis (📊 🛰️ 🌿 🏗️ 💰 🫁), bullet points, specific numbers. End with CLEAR verdict.

🚫 NEVER say \"consult professionals\". ✅ ALWAYS say \"Based on the data, here's what you should do...\"

";

const MISSING: &str = "n/a";

/// Build the context block: one line per present field, then the satellite block.
/// Returns an empty string when nothing is known.
pub fn compose_context_info(ctx: &ContextSnapshot) -> String {
    let mut info = String::new();

    if let Some(location) = ctx.location() {
        info.push_str(&format!("\n📍 Location: {}", location));
    }
    if let Some(business_type) = ctx.business_type() {
        info.push_str(&format!("\n🏢 Business Type: {}", business_type));
    }
    if let Some(score) = ctx.success_score {
        info.push_str(&format!("\n📊 Success Score: {}/100", score));
    }

    if let Some((data, stats)) = ctx.satellite_statistics() {
        let change = stats
            .change_percentage
            .map(|c| fixed(c, 1))
            .unwrap_or_else(|| MISSING.to_string());
        let pixels = stats
            .changed_pixels
            .map(group_thousands)
            .unwrap_or_else(|| MISSING.to_string());
        let confidence = data
            .model_info
            .as_ref()
            .and_then(|m| m.confidence)
            .map(|c| fixed(c * 100.0, 0))
            .unwrap_or_else(|| MISSING.to_string());

        info.push_str("\n\n🛰️ SATELLITE DATA:");
        info.push_str(&format!("\n• Change: {}%", change));
        info.push_str(&format!("\n• Pixels Changed: {}", pixels));
        info.push_str(&format!(
            "\n• Dates: {} to {}",
            data.before_date.as_deref().unwrap_or(MISSING),
            data.after_date.as_deref().unwrap_or(MISSING)
        ));
        info.push_str(&format!("\n• Model Confidence: {}%", confidence));
    }

    info
}

/// Full system instruction: fixed persona and rules, plus `CURRENT CONTEXT` when any field is known.
pub fn compose_system_prompt(ctx: &ContextSnapshot) -> String {
    let info = compose_context_info(ctx);
    let mut prompt = String::with_capacity(PREAMBLE.len() + info.len() + 20);
    prompt.push_str(PREAMBLE);
    if !info.is_empty() {
        prompt.push_str("\nCURRENT CONTEXT:");
        prompt.push_str(&info);
    }
    prompt
}

/// `places` decimals, ties rounded away from zero (0.25 -> "0.3"). `{:.N}` alone rounds ties to even.
fn fixed(value: f64, places: u32) -> String {
    let scale = 10f64.powi(places as i32);
    format!("{:.*}", places as usize, (value * scale).round() / scale)
}

/// 1234567 -> "1,234,567"
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

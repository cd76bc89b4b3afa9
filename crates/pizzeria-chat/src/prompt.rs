//! Fixed texts sent to, or shown in place of, the model.

use pizzeria_core::types::ChatMessage;

/// Asks the model to restate the conversation as an order object.
pub const ORDER_SUMMARY_INSTRUCTION: &str = "Please create a JSON summary of the customer's complete order using this exact format:\n\
{\n \
\"pizzas\": [{\"name\": \"pizza_name\", \"size\": \"S/M/L\", \"qty\": number}],\n \
\"toppings\": [{\"name\": \"topping_name\", \"qty\": number, \"applies_to\": \"all\"}],\n \
\"drinks\": [{\"name\": \"drink_name\", \"size\": \"S/M/L\", \"qty\": number}],\n \
\"sides\": [{\"name\": \"side_name\", \"size\": \"size_if_applicable\", \"qty\": number}],\n \
\"delivery_method\": \"pickup\" or \"delivery\",\n \
\"address\": \"customer_address_if_delivery\" or null,\n \
\"notes\": \"any_special_instructions\" or null\n\
}\n\
Return ONLY the JSON - no other text or commentary.";

/// Shown when the model answers with nothing at all.
pub const EMPTY_REPLY_APOLOGY: &str =
    "⚠️ Sorry, I'm having trouble connecting to our ordering system. Please try again!";

/// System instruction with the rendered menu embedded verbatim.
pub fn system_prompt(restaurant: &str, menu_text: &str) -> String {
    format!(
        "You are OrderBot, a friendly AI assistant for {restaurant}! 🍕\n\
         - Greet customers warmly and help them place orders\n\
         - Be enthusiastic about the food and make recommendations\n\
         - Always clarify sizes, quantities, and any special requests\n\
         - Ask about pickup or delivery, and collect address if needed\n\
         - Summarize orders clearly before finalizing\n\
         - Only offer items from our menu below\n\
         - Be helpful, friendly, and make the ordering experience enjoyable!\n\n\
         🍽️ {heading} MENU:\n{menu_text}\n\n\
         Remember: Great customer service makes great pizza even better! 😊",
        heading = restaurant.to_uppercase(),
    )
}

pub fn system_message(restaurant: &str, menu_text: &str) -> ChatMessage {
    ChatMessage::system(system_prompt(restaurant, menu_text))
}

/// Opening line of a fresh session.
pub fn welcome(restaurant: &str) -> String {
    format!(
        "🍕 Welcome to {restaurant}! I'm your AI ordering assistant. What delicious pizza can I \
         help you with today? Our most popular items are the Supreme Pizza and our famous garlic \
         bread! 😊"
    )
}

/// Opening line after the previous order was cleared.
pub fn welcome_back(restaurant: &str) -> String {
    format!(
        "🍕 Welcome to {restaurant}! I'm ready to take your next order. What can I get started \
         for you today? 😊"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pizzeria_core::types::Role;

    #[test]
    fn test_system_prompt_embeds_menu_verbatim() {
        let menu = "🍕 PIZZAS:\n   • Margherita (S: $12.99, M: $16.99, L: $20.99)";
        let msg = system_message("Sajid's Pizzeria", menu);
        assert_eq!(msg.role, Role::System);
        assert!(msg.content.starts_with("You are OrderBot, a friendly AI assistant for Sajid's Pizzeria!"));
        assert!(msg.content.contains("🍽️ SAJID'S PIZZERIA MENU:\n🍕 PIZZAS:\n"));
        assert!(msg.content.contains(menu));
        assert!(msg.content.ends_with("even better! 😊"));
    }

    #[test]
    fn test_order_instruction_lists_every_category() {
        for key in ["\"pizzas\"", "\"toppings\"", "\"drinks\"", "\"sides\"", "\"delivery_method\""] {
            assert!(ORDER_SUMMARY_INSTRUCTION.contains(key), "missing {key}");
        }
        assert!(ORDER_SUMMARY_INSTRUCTION.contains("\n \"pizzas\": [{\"name\""));
        assert!(ORDER_SUMMARY_INSTRUCTION.ends_with("Return ONLY the JSON - no other text or commentary."));
    }

    #[test]
    fn test_welcome_texts() {
        assert!(welcome("Luigi's").starts_with("🍕 Welcome to Luigi's! I'm your AI ordering assistant."));
        assert!(welcome("Luigi's").contains("What delicious pizza can I help you with today?"));
        assert!(welcome_back("Luigi's").contains("ready to take your next order"));
    }
}

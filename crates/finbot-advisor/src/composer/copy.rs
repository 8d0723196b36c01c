//! Static reply copy for intents that need no data source.

use crate::classifier::Redirect;

pub struct StaticCopy {
    pub title: &'static str,
    pub message: &'static str,
    pub summary: &'static [&'static str],
}

const SUGGESTIONS: &[&str] = &[
    "Ask about a stock, like \"analyze Apple\"",
    "Ask about crypto, like \"Bitcoin price trends\"",
    "Upload a portfolio CSV for a personal review",
];

pub fn redirect(redirect: Redirect) -> StaticCopy {
    match redirect {
        Redirect::Greeting => StaticCopy {
            title: "Hello! Let's Talk Finance",
            message: "Hello there! 👋 I'm Max, your friendly financial advisor. While I'd love to chat about \
                      everything, I'm really passionate about investments, stocks, crypto and portfolio \
                      management! 💰\n\nWhat financial topic can I help you explore today? 📈",
            summary: SUGGESTIONS,
        },
        Redirect::Wellbeing => StaticCopy {
            title: "Doing Great and Ready to Talk Finance",
            message: "I'm doing great, thanks for asking! 😊 I'm always excited to talk about finance and help \
                      people make smart money decisions. Are you looking to analyze an investment or check \
                      on market trends? 📊",
            summary: SUGGESTIONS,
        },
        Redirect::Thanks => StaticCopy {
            title: "Happy to Help with Finance",
            message: "You're very welcome! 😊 Got any other questions about stocks, crypto or your \
                      investments? I'm here to help! 💪",
            summary: SUGGESTIONS,
        },
        Redirect::OffTopic => StaticCopy {
            title: "I Specialize in Finance",
            message: "That sounds interesting! 😊 I'm specialized in financial topics though, so that's where \
                      I can give you the best insights. 💰\n\nHow about one of these?\n📈 Stock market trends\n\
                      ₿ Cryptocurrency analysis\n💼 Portfolio optimization\n📊 Investment opportunities",
            summary: &[
                "Stock market trends",
                "Cryptocurrency analysis",
                "Portfolio optimization",
            ],
        },
    }
}

pub const FINANCIAL_GENERAL: StaticCopy = StaticCopy {
    title: "Let's Get Specific",
    message: "I love talking general finance! 💰 But I'm even better when we dive into specific assets. \
              Try asking about:\n\n📈 Individual stocks (Apple, Tesla, Microsoft...)\n₿ Crypto prices \
              (Bitcoin, Ethereum...)\n🏆 Commodities (Gold, Oil, Silver...)\n📊 Or upload your portfolio \
              for personalized insights!",
    summary: &[
        "Individual stocks: Apple, Tesla, Microsoft",
        "Crypto: Bitcoin, Ethereum",
        "Commodities: Gold, Oil, Silver",
    ],
};

pub const WELCOME: StaticCopy = StaticCopy {
    title: "Welcome to FinBot",
    message: "Hey there! I'm Max, your friendly finance buddy! 🤝\n\nI'm here to help with:\n📈 Stock \
              analysis (try 'analyze Apple')\n₿ Crypto insights (ask about Bitcoin)\n📁 Portfolio reviews \
              (upload your CSV)\n📊 Charts and trends\n\nWhat financial topic can I help you explore? 💭",
    summary: SUGGESTIONS,
};

pub const CLARIFICATION: StaticCopy = StaticCopy {
    title: "No Portfolio Loaded Yet",
    message: "I'd love to review your portfolio, but I don't see one yet! 📁\n\nUpload a CSV with columns \
              like symbol, shares, current_price and market_value, then ask me to \"analyze my portfolio\".",
    summary: &["Upload a CSV export from your broker", "Then ask \"analyze my portfolio\""],
};

pub const GENERAL: StaticCopy = StaticCopy {
    title: "Not Sure What You're Looking For",
    message: "Hmm, I'm not sure what you're looking for! 🤔\n\nTry asking about a specific stock, crypto or \
              commodity, or ask about your uploaded portfolio. I'm here to help with all things finance! 💰",
    summary: SUGGESTIONS,
};

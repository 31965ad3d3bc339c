use gloo_timers::callback::Interval;
use yew::prelude::*;

use crate::format::format_currency;
use crate::AuthScreen;

const COUNTER_TICK_MS: u32 = 30;
const COUNTER_STEPS: u32 = 40;

struct Stat {
    label: &'static str,
    target: f64,
    money: bool,
}

const STATS: [Stat; 3] = [
    Stat { label: "Entries recorded every day", target: 12500.0, money: false },
    Stat { label: "Tracked for shops like yours", target: 48000000.0, money: true },
    Stat { label: "Seconds to log a sale by voice", target: 5.0, money: false },
];

#[derive(Properties, PartialEq)]
pub struct LandingPageProps {
    pub on_authenticated: Callback<()>,
}

#[function_component(LandingPage)]
pub fn landing_page(props: &LandingPageProps) -> Html {
    // One eased progress value drives all three counters.
    let progress = use_state(|| 0.0_f64);
    let ticker = use_mut_ref(|| None::<Interval>);

    {
        let progress = progress.clone();
        let ticker = ticker.clone();
        use_effect_with_deps(
            move |_| {
                // Count ticks locally; the state handle only ever receives.
                let mut ticks = 0u32;
                *ticker.borrow_mut() = Some(Interval::new(COUNTER_TICK_MS, {
                    let progress = progress.clone();
                    let ticker = ticker.clone();
                    move || {
                        ticks += 1;
                        progress.set((f64::from(ticks) / f64::from(COUNTER_STEPS)).min(1.0));
                        if ticks >= COUNTER_STEPS {
                            ticker.borrow_mut().take();
                        }
                    }
                }));
                move || {
                    ticker.borrow_mut().take();
                }
            },
            (),
        );
    }

    let eased = {
        let p = *progress;
        // ease-out curve so counters slow into their targets
        1.0 - (1.0 - p) * (1.0 - p)
    };

    let marquee_items = [
        "Voice entries in Hindi, English or Hinglish",
        "Snap a bill, get the GST split",
        "Ask \"Aaj kitna kamaya?\"",
        "Weekly cash summaries",
    ];

    html! {
        <div class="min-h-screen bg-background">
            <header class="max-w-6xl mx-auto px-6 py-6 flex items-center justify-between">
                <div class="flex items-center gap-3">
                    <div class="w-10 h-10 bg-[#173E63] rounded-full flex items-center justify-center text-white font-black">{"L"}</div>
                    <span class="text-[#173E63] text-2xl font-black tracking-tight">{"Ledgerly"}</span>
                </div>
            </header>

            <section class="max-w-6xl mx-auto px-6 pt-10 pb-16 grid grid-cols-1 lg:grid-cols-2 gap-12 items-center">
                <div class="space-y-6">
                    <h1 class="text-4xl md:text-5xl font-black text-[#173E63] leading-tight">
                        {"Bookkeeping that listens."}
                    </h1>
                    <p class="text-lg text-muted-foreground">
                        {"Speak a sale, snap a bill, and let Ledgerly keep your khata. Built for small Indian businesses."}
                    </p>

                    <div class="grid grid-cols-3 gap-4">
                        { for STATS.iter().map(|stat| {
                            let value = stat.target * eased;
                            let shown = if stat.money {
                                format_currency(value.round())
                            } else {
                                format!("{}", value.round() as i64)
                            };
                            html! {
                                <div class="bg-card rounded-[10px] p-4 border border-border">
                                    <p class="text-xl font-bold text-[#1D617A]">{ shown }</p>
                                    <p class="text-xs text-muted-foreground mt-1">{ stat.label }</p>
                                </div>
                            }
                        }) }
                    </div>

                    <div class="overflow-hidden border-y border-border py-3">
                        <div class="marquee flex gap-10 whitespace-nowrap text-sm text-muted-foreground">
                            { for marquee_items.iter().chain(marquee_items.iter()).map(|item| html! {
                                <span>{ *item }</span>
                            }) }
                        </div>
                    </div>
                </div>

                <AuthScreen on_authenticated={props.on_authenticated.clone()} />
            </section>
        </div>
    }
}
